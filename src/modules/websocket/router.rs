/// Event Router
///
/// Orchestrator cho mọi inbound event: authorize membership → persist →
/// fan-out. State machine mỗi event:
///
///   Received → Authorized → Persisted → Broadcast → Acknowledged
///                 ↓ (authz/validation)      ↓ (storage)
///              Rejected                   Failed
///
/// Rejected/Failed chỉ trả lỗi về connection gửi, không bao giờ
/// broadcast; message đã persist không bao giờ bị un-persist vì fan-out
/// không có người nhận. Trong một room, thứ tự persist quyết định thứ
/// tự broadcast: persist + submit vào hub nằm trong cùng critical
/// section của per-room lock.
use actix::Addr;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        group::handle::GroupSvc,
        message::{
            handle::MessageSvc,
            schema::{GroupMessageKind, MessagePayload},
        },
        room::handle::RoomSvc,
        user::{repository_pg::UserRepositoryPg, service::UserService},
        websocket::{
            events::BroadcastToRoom,
            hub::ConnectionHub,
            protocol::{ClientFrame, ReplyPreview, ServerFrame},
        },
    },
};

pub type UserSvc = UserService<UserRepositoryPg>;

/// Room đích của một connection, lấy từ path lúc handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTarget {
    Private(Uuid),
    Group(Uuid),
}

impl RoomTarget {
    pub fn room_id(&self) -> Uuid {
        match self {
            RoomTarget::Private(id) | RoomTarget::Group(id) => *id,
        }
    }
}

/// Trạng thái pipeline của một inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Received,
    Authorized,
    Persisted,
    Broadcast,
    Acknowledged,
    Rejected,
    Failed,
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryState::Acknowledged | DeliveryState::Rejected | DeliveryState::Failed
        )
    }
}

/// Per-room lock: serialize persist + hub submission của các sender
/// đồng thời vào cùng room. Sender tới room khác không đụng nhau.
#[derive(Clone, Default)]
pub struct RoomSequencers {
    locks: Arc<StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl RoomSequencers {
    pub fn lock_for(&self, room_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("sequencer map poisoned");
        locks.entry(room_id).or_default().clone()
    }
}

#[derive(Clone)]
pub struct EventRouter {
    room_service: RoomSvc,
    group_service: GroupSvc,
    message_service: MessageSvc,
    user_service: UserSvc,
    hub: Arc<Addr<ConnectionHub>>,
    sequencers: RoomSequencers,
}

impl EventRouter {
    pub fn new(
        room_service: RoomSvc,
        group_service: GroupSvc,
        message_service: MessageSvc,
        user_service: UserSvc,
        hub: Arc<Addr<ConnectionHub>>,
    ) -> Self {
        EventRouter {
            room_service,
            group_service,
            message_service,
            user_service,
            hub,
            sequencers: RoomSequencers::default(),
        }
    }

    /// Chạy một inbound event qua pipeline. Lỗi trả về chỉ tới sender.
    pub async fn dispatch(
        &self,
        target: RoomTarget,
        sender_id: Uuid,
        frame: ClientFrame,
    ) -> Result<(), error::SystemError> {
        let room_id = target.room_id();
        tracing::debug!(state = ?DeliveryState::Received, %room_id, %sender_id, "inbound event");

        // Received → Authorized: sender phải thuộc current_members
        let member_ids = match self.authorize(target, sender_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::debug!(state = ?DeliveryState::Rejected, %room_id, %sender_id, "{}", e);
                return Err(e);
            }
        };
        tracing::debug!(state = ?DeliveryState::Authorized, %room_id, %sender_id, "event");

        // Profile sender lấy trước khi vào critical section (có cache)
        let sender = self
            .user_service
            .get_profile(&sender_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        // Persist + submit broadcast dưới per-room lock: persistence
        // order == broadcast order cho mọi subscriber
        let lock = self.sequencers.lock_for(room_id);
        let _guard = lock.lock().await;

        let server_frame = match self.persist(target, sender_id, &sender.username, frame).await {
            Ok(f) => f,
            Err(e) => {
                let state = match &e {
                    error::SystemError::InvalidOperation(_) | error::SystemError::BadRequest(_) => {
                        DeliveryState::Rejected
                    }
                    _ => DeliveryState::Failed,
                };
                tracing::debug!(state = ?state, %room_id, %sender_id, "{}", e);
                return Err(e);
            }
        };
        tracing::debug!(state = ?DeliveryState::Persisted, %room_id, %sender_id, "event");

        // Persisted → Broadcast: best-effort, không bao giờ rollback
        self.hub.do_send(BroadcastToRoom { room_id, frame: server_frame, member_ids });
        tracing::debug!(state = ?DeliveryState::Broadcast, %room_id, %sender_id, "event");

        tracing::debug!(state = ?DeliveryState::Acknowledged, %room_id, %sender_id, "event");

        Ok(())
    }

    async fn authorize(
        &self,
        target: RoomTarget,
        sender_id: Uuid,
    ) -> Result<Vec<Uuid>, error::SystemError> {
        let members = match target {
            RoomTarget::Private(room_id) => {
                self.room_service.current_members(room_id).await?.to_vec()
            }
            RoomTarget::Group(group_id) => self.group_service.current_members(group_id).await?,
        };

        if !members.contains(&sender_id) {
            return Err(error::SystemError::not_authorized(
                "You are not a member of this room",
            ));
        }

        Ok(members)
    }

    async fn persist(
        &self,
        target: RoomTarget,
        sender_id: Uuid,
        sender_username: &str,
        frame: ClientFrame,
    ) -> Result<ServerFrame, error::SystemError> {
        match target {
            RoomTarget::Private(room_id) => {
                // Private room chỉ có text; kind/attachment/reply bị bỏ qua
                let message =
                    self.message_service.append_private(room_id, sender_id, frame.message).await?;

                Ok(ServerFrame::Message {
                    message_id: message.id,
                    message: message.content,
                    sender_id,
                    sender_username: sender_username.to_string(),
                    message_type: GroupMessageKind::Text,
                    timestamp: message.created_at.to_rfc3339(),
                    reply_to: None,
                })
            }

            RoomTarget::Group(group_id) => {
                let payload = build_payload(&frame)?;

                let appended = self
                    .message_service
                    .append_group(group_id, sender_id, payload, frame.reply_to)
                    .await?;

                let reply_to = match appended.reply_to {
                    None => None,
                    Some(row) => {
                        let username = match row.sender_id {
                            Some(id) => self
                                .user_service
                                .get_profile(&id)
                                .await?
                                .map(|p| p.username)
                                .unwrap_or_default(),
                            None => String::new(),
                        };
                        Some(ReplyPreview { id: row.id, content: row.content, sender_username: username })
                    }
                };

                let message = appended.message;
                Ok(ServerFrame::Message {
                    message_id: message.id,
                    message: message.payload.content().to_string(),
                    sender_id,
                    sender_username: sender_username.to_string(),
                    message_type: message.payload.kind(),
                    timestamp: message.created_at.to_rfc3339(),
                    reply_to,
                })
            }
        }
    }
}

/// Dựng payload từ inbound frame. Image/doc bắt buộc phải có
/// attachment đã stage; validation fail trước khi chạm storage.
fn build_payload(frame: &ClientFrame) -> Result<MessagePayload, error::SystemError> {
    let kind = frame.message_type.unwrap_or(GroupMessageKind::Text);

    match kind {
        GroupMessageKind::Text => Ok(MessagePayload::Text { content: frame.message.clone() }),
        GroupMessageKind::Image | GroupMessageKind::Doc => {
            let url = frame.attachment_url.clone().ok_or_else(|| {
                error::SystemError::bad_request("Attachment must be staged before sending")
            })?;

            Ok(match kind {
                GroupMessageKind::Image => {
                    MessagePayload::Image { content: frame.message.clone(), attachment_url: url }
                }
                _ => MessagePayload::Doc { content: frame.message.clone(), attachment_url: url },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(DeliveryState::Acknowledged.is_terminal());
        assert!(DeliveryState::Rejected.is_terminal());
        assert!(DeliveryState::Failed.is_terminal());
        assert!(!DeliveryState::Received.is_terminal());
        assert!(!DeliveryState::Persisted.is_terminal());
    }

    #[test]
    fn test_sequencer_returns_same_lock_for_same_room() {
        let sequencers = RoomSequencers::default();
        let room = Uuid::now_v7();

        let a = sequencers.lock_for(room);
        let b = sequencers.lock_for(room);

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_sequencer_isolates_rooms() {
        let sequencers = RoomSequencers::default();

        let a = sequencers.lock_for(Uuid::now_v7());
        let b = sequencers.lock_for(Uuid::now_v7());

        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_text_payload_needs_no_attachment() {
        let frame = ClientFrame {
            message: "hello".to_string(),
            message_type: None,
            attachment_url: None,
            reply_to: None,
        };

        let payload = build_payload(&frame).unwrap();
        assert_eq!(payload, MessagePayload::Text { content: "hello".to_string() });
    }

    #[test]
    fn test_image_payload_requires_staged_attachment() {
        let frame = ClientFrame {
            message: "ảnh".to_string(),
            message_type: Some(GroupMessageKind::Image),
            attachment_url: None,
            reply_to: None,
        };

        assert!(build_payload(&frame).is_err());
    }

    #[test]
    fn test_doc_payload_carries_url() {
        let frame = ClientFrame {
            message: "báo cáo quý".to_string(),
            message_type: Some(GroupMessageKind::Doc),
            attachment_url: Some("http://files/report.pdf".to_string()),
            reply_to: None,
        };

        let payload = build_payload(&frame).unwrap();
        assert_eq!(payload.attachment_url(), Some("http://files/report.pdf"));
    }
}
