use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

use crate::api::error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "group_message_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupMessageKind {
    Text,
    Image,
    Doc,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrivateMessageEntity {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub is_archived: bool,
    #[serde(skip)]
    pub seq: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row phẳng như lưu trong Postgres. Cột nullable theo kind không được
/// leak lên domain: chuyển thành `GroupMessage` ngay tại boundary.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMessageRow {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: GroupMessageKind,
    pub content: String,
    pub attachment_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub is_edited: bool,
    pub edited_at: Option<chrono::DateTime<chrono::Utc>>,
    pub seq: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Payload theo kind: envelope chung + một arm cho mỗi loại.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text { content: String },
    Image { content: String, attachment_url: String },
    Doc { content: String, attachment_url: String },
}

impl MessagePayload {
    pub fn kind(&self) -> GroupMessageKind {
        match self {
            MessagePayload::Text { .. } => GroupMessageKind::Text,
            MessagePayload::Image { .. } => GroupMessageKind::Image,
            MessagePayload::Doc { .. } => GroupMessageKind::Doc,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            MessagePayload::Text { content }
            | MessagePayload::Image { content, .. }
            | MessagePayload::Doc { content, .. } => content,
        }
    }

    pub fn attachment_url(&self) -> Option<&str> {
        match self {
            MessagePayload::Text { .. } => None,
            MessagePayload::Image { attachment_url, .. }
            | MessagePayload::Doc { attachment_url, .. } => Some(attachment_url),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMessage {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub reply_to_id: Option<Uuid>,
    pub is_edited: bool,
    pub edited_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub payload: MessagePayload,
    #[serde(skip)]
    pub seq: i64,
}

impl TryFrom<GroupMessageRow> for GroupMessage {
    type Error = error::SystemError;

    fn try_from(row: GroupMessageRow) -> Result<Self, Self::Error> {
        let payload = match (row.kind, row.attachment_url) {
            (GroupMessageKind::Text, _) => MessagePayload::Text { content: row.content },
            (GroupMessageKind::Image, Some(url)) => {
                MessagePayload::Image { content: row.content, attachment_url: url }
            }
            (GroupMessageKind::Doc, Some(url)) => {
                MessagePayload::Doc { content: row.content, attachment_url: url }
            }
            (kind, None) => {
                return Err(error::SystemError::DatabaseError(
                    format!("group message {} of kind {:?} has no attachment", row.id, kind).into(),
                ));
            }
        };

        Ok(GroupMessage {
            id: row.id,
            group_id: row.group_id,
            sender_id: row.sender_id,
            reply_to_id: row.reply_to_id,
            is_edited: row.is_edited,
            edited_at: row.edited_at,
            created_at: row.created_at,
            payload,
            seq: row.seq,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: GroupMessageKind, attachment_url: Option<&str>) -> GroupMessageRow {
        GroupMessageRow {
            id: Uuid::now_v7(),
            group_id: Uuid::now_v7(),
            sender_id: Some(Uuid::now_v7()),
            kind,
            content: "hello".to_string(),
            attachment_url: attachment_url.map(|s| s.to_string()),
            reply_to_id: None,
            is_edited: false,
            edited_at: None,
            seq: 1,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_text_row_converts_without_attachment() {
        let msg = GroupMessage::try_from(row(GroupMessageKind::Text, None)).unwrap();
        assert_eq!(msg.payload, MessagePayload::Text { content: "hello".to_string() });
    }

    #[test]
    fn test_image_row_requires_attachment() {
        assert!(GroupMessage::try_from(row(GroupMessageKind::Image, None)).is_err());

        let msg =
            GroupMessage::try_from(row(GroupMessageKind::Image, Some("http://x/y.png"))).unwrap();
        assert_eq!(msg.payload.kind(), GroupMessageKind::Image);
        assert_eq!(msg.payload.attachment_url(), Some("http://x/y.png"));
    }

    #[test]
    fn test_payload_serializes_with_message_type_tag() {
        let msg =
            GroupMessage::try_from(row(GroupMessageKind::Doc, Some("http://x/a.pdf"))).unwrap();
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["message_type"], "doc");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["attachment_url"], "http://x/a.pdf");
        // seq là chi tiết lưu trữ, không serialize
        assert!(json.get("seq").is_none());
    }
}
