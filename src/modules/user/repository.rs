use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::UserProfile, schema::UserEntity},
};

#[async_trait::async_trait]
pub trait UserRepository {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres>;

    async fn find_by_id(&self, user_id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_profiles_by_ids(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserProfile>, error::SystemError>;
}
