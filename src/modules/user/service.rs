use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    configs::RedisCache,
    constants::PROFILE_CACHE_TTL_SECS,
    modules::user::{model::UserProfile, repository::UserRepository},
};

/// Directory tra cứu principal, cache qua Redis.
///
/// Nằm trên đường fan-out (mỗi outbound frame cần sender_username) nên
/// đọc cache trước, DB sau; cache miss được ghi lại với TTL ngắn.
#[derive(Clone)]
pub struct UserService<U>
where
    U: UserRepository + Send + Sync,
{
    user_repo: Arc<U>,
    cache: Arc<RedisCache>,
}

fn profile_cache_key(user_id: &Uuid) -> String {
    format!("profile:{user_id}")
}

impl<U> UserService<U>
where
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(user_repo: Arc<U>, cache: Arc<RedisCache>) -> Self {
        UserService { user_repo, cache }
    }

    pub async fn get_profile(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<UserProfile>, error::SystemError> {
        let key = profile_cache_key(user_id);

        // Cache lỗi thì bỏ qua, đọc thẳng DB
        if let Ok(Some(cached)) = self.cache.get::<UserProfile>(&key).await {
            return Ok(Some(cached));
        }

        let Some(user) = self.user_repo.find_by_id(user_id).await? else {
            return Ok(None);
        };

        let profile = UserProfile::from(user);
        if let Err(e) = self.cache.set(&key, &profile, PROFILE_CACHE_TTL_SECS).await {
            tracing::warn!("Không thể ghi profile {} vào cache: {}", user_id, e);
        }

        Ok(Some(profile))
    }

    /// Batch lookup cho danh sách members, không qua cache.
    pub async fn get_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserProfile>, error::SystemError> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }
        self.user_repo.find_profiles_by_ids(user_ids).await
    }
}
