use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartChatBody {
    pub user_id: Uuid,
}

/// Một dòng trong danh sách chat của user: room + người đối diện + số chưa đọc.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoomSummary {
    pub room_id: Uuid,
    pub peer_id: Uuid,
    pub peer_username: String,
    pub peer_display_name: String,
    pub unread_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub room_id: Uuid,
    pub participant_low_id: Uuid,
    pub participant_high_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}
