use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::error,
    modules::message::schema::{GroupMessage, MessagePayload, PrivateMessageEntity},
};

#[derive(Debug, Clone)]
pub struct InsertPrivateMessage {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct InsertGroupMessage {
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub payload: MessagePayload,
    pub reply_to_id: Option<Uuid>,
}

/// Cursor keyset trên (created_at, seq): timestamp phân trang, seq phá
/// hòa khi hai message cùng timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCursor {
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub seq: i64,
}

impl MessageCursor {
    pub fn encode(&self) -> String {
        format!("{}|{}", self.created_at.to_rfc3339(), self.seq)
    }

    pub fn decode(raw: &str) -> Result<Self, error::SystemError> {
        let (ts, seq) = raw
            .split_once('|')
            .ok_or_else(|| error::SystemError::bad_request("Invalid cursor format"))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(ts)
            .map_err(|_| error::SystemError::bad_request("Invalid cursor format"))?
            .with_timezone(&chrono::Utc);

        let seq = seq
            .parse::<i64>()
            .map_err(|_| error::SystemError::bad_request("Invalid cursor format"))?;

        Ok(MessageCursor { created_at, seq })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrivateHistoryResponse {
    pub messages: Vec<PrivateMessageEntity>,
    pub cursor: Option<String>,
    pub marked_read: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupHistoryResponse {
    pub messages: Vec<GroupMessage>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditMessageBody {
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkReadResponse {
    pub marked_read: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let cursor = MessageCursor { created_at: chrono::Utc::now(), seq: 42 };
        let decoded = MessageCursor::decode(&cursor.encode()).unwrap();

        assert_eq!(decoded.seq, 42);
        assert_eq!(decoded.created_at, cursor.created_at);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(MessageCursor::decode("not-a-cursor").is_err());
        assert!(MessageCursor::decode("2024-01-01T00:00:00Z|not-a-number").is_err());
        assert!(MessageCursor::decode("not-a-date|7").is_err());
    }
}
