use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::UserProfile, repository::UserRepository, schema::UserEntity},
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    async fn find_by_id(&self, user_id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_profiles_by_ids(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserProfile>, error::SystemError> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT id, username, display_name FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }
}
