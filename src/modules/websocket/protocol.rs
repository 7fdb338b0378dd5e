/// WebSocket Wire Protocol
///
/// Định nghĩa frame trao đổi giữa client và server trên một connection
/// đã subscribe vào đúng một room (room nằm trong path lúc handshake,
/// không nằm trong frame).
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::message::schema::GroupMessageKind;

/// Frame client gửi lên: nội dung + kind (mặc định text) + quote.
/// Với kind image/doc, `attachment_url` là URL đã stage qua
/// `POST /api/attachments`; router không nhận payload chưa stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub message: String,
    #[serde(default)]
    pub message_type: Option<GroupMessageKind>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub reply_to: Option<Uuid>,
}

/// Quote rút gọn của message được reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPreview {
    pub id: Uuid,
    pub content: String,
    pub sender_username: String,
}

/// Frame server đẩy xuống các subscriber của room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Message {
        message_id: Uuid,
        message: String,
        sender_id: Uuid,
        sender_username: String,
        message_type: GroupMessageKind,
        timestamp: String,
        reply_to: Option<ReplyPreview>,
    },
    MessageEdited {
        message_id: Uuid,
        message: String,
    },
    MessageDeleted {
        message_id: Uuid,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    // === ClientFrame deserialization ===

    #[test]
    fn test_client_frame_minimal() {
        let json = r#"{"message":"Xin chào!"}"#;
        let frame: ClientFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.message, "Xin chào!");
        assert!(frame.message_type.is_none());
        assert!(frame.reply_to.is_none());
    }

    #[test]
    fn test_client_frame_with_attachment_kind() {
        let json =
            r#"{"message":"ảnh nè","message_type":"image","attachment_url":"http://x/y.png"}"#;
        let frame: ClientFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.message_type, Some(GroupMessageKind::Image));
        assert_eq!(frame.attachment_url.as_deref(), Some("http://x/y.png"));
    }

    #[test]
    fn test_client_frame_with_reply() {
        let id = Uuid::now_v7();
        let json = format!(r#"{{"message":"đồng ý","reply_to":"{id}"}}"#);
        let frame: ClientFrame = serde_json::from_str(&json).unwrap();

        assert_eq!(frame.reply_to, Some(id));
    }

    #[test]
    fn test_client_frame_missing_message_is_rejected() {
        let json = r#"{"message_type":"text"}"#;
        assert!(serde_json::from_str::<ClientFrame>(json).is_err());
    }

    #[test]
    fn test_client_frame_unknown_kind_is_rejected() {
        let json = r#"{"message":"x","message_type":"video"}"#;
        assert!(serde_json::from_str::<ClientFrame>(json).is_err());
    }

    // === ServerFrame serialization ===

    #[test]
    fn test_message_frame_shape() {
        let frame = ServerFrame::Message {
            message_id: Uuid::now_v7(),
            message: "hello".to_string(),
            sender_id: Uuid::now_v7(),
            sender_username: "an.nguyen".to_string(),
            message_type: GroupMessageKind::Text,
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            reply_to: None,
        };
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "message");
        assert_eq!(json["message_type"], "text");
        assert_eq!(json["sender_username"], "an.nguyen");
        // reply_to vắng mặt phải serialize thành null, không bị bỏ field
        assert!(json["reply_to"].is_null());
    }

    #[test]
    fn test_message_frame_with_reply_preview() {
        let reply_id = Uuid::now_v7();
        let frame = ServerFrame::Message {
            message_id: Uuid::now_v7(),
            message: "đồng ý".to_string(),
            sender_id: Uuid::now_v7(),
            sender_username: "binh".to_string(),
            message_type: GroupMessageKind::Text,
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            reply_to: Some(ReplyPreview {
                id: reply_id,
                content: "họp lúc 3h nhé".to_string(),
                sender_username: "an.nguyen".to_string(),
            }),
        };
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["reply_to"]["id"], reply_id.to_string());
        assert_eq!(json["reply_to"]["sender_username"], "an.nguyen");
    }

    #[test]
    fn test_error_frame_shape() {
        let frame = ServerFrame::Error { message: "Not authorized".to_string() };
        let json = serde_json::to_string(&frame).unwrap();

        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains("Not authorized"));
    }

    #[test]
    fn test_message_deleted_frame_shape() {
        let frame = ServerFrame::MessageDeleted { message_id: Uuid::now_v7() };
        let json = serde_json::to_string(&frame).unwrap();

        assert!(json.contains(r#""type":"message_deleted""#));
    }
}
