use uuid::Uuid;

use crate::modules::websocket::protocol::ServerFrame;

/// Collaborator giao notification ngoài band (push/email).
///
/// Fire-and-forget: không bao giờ block pipeline fan-out, lỗi được nuốt
/// sau khi log. Implementation thật nằm ở hệ thống ngoài; backend này
/// chỉ gọi qua seam.
pub trait Notifier: Send + Sync {
    fn notify(&self, principal: Uuid, frame: &ServerFrame);
}

/// Notifier mặc định: chỉ ghi log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, principal: Uuid, frame: &ServerFrame) {
        let kind = match frame {
            ServerFrame::Message { .. } => "message",
            ServerFrame::MessageEdited { .. } => "message_edited",
            ServerFrame::MessageDeleted { .. } => "message_deleted",
            ServerFrame::Error { .. } => "error",
        };
        tracing::debug!("Notify user {} (offline): {}", principal, kind);
    }
}
