use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::modules::user::schema::UserEntity;

/// Hình chiếu public của một user, đủ để serialize vào frame và cache Redis.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

impl From<UserEntity> for UserProfile {
    fn from(user: UserEntity) -> Self {
        UserProfile { id: user.id, username: user.username, display_name: user.display_name }
    }
}
