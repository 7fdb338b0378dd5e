use actix::Addr;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    modules::{
        group::repository::MembershipRepository,
        message::{
            model::{
                GroupHistoryResponse, InsertGroupMessage, InsertPrivateMessage, MessageCursor,
                PrivateHistoryResponse,
            },
            repository::{GroupMessageRepository, PrivateMessageRepository, ReadStatusRepository},
            schema::{GroupMessage, GroupMessageRow, MessagePayload, PrivateMessageEntity},
        },
        room::repository::PrivateRoomRepository,
        websocket::{
            events::BroadcastToRoom,
            hub::ConnectionHub,
            protocol::ServerFrame,
        },
    },
};

/// Kết quả append group message: message mới + row được quote (nếu có)
/// để caller dựng reply preview mà không phải query lại.
#[derive(Debug, Clone)]
pub struct AppendedGroupMessage {
    pub message: GroupMessage,
    pub reply_to: Option<GroupMessageRow>,
}

/// Message Store: append có thứ tự, history phân trang keyset,
/// mark-read idempotent.
///
/// Authorization membership là trách nhiệm của caller (Event Router cho
/// đường WS); các đường HTTP trong service này tự check trước khi đọc.
#[derive(Clone)]
pub struct MessageService<P, G, S, R, M>
where
    P: PrivateMessageRepository + Send + Sync,
    G: GroupMessageRepository + Send + Sync,
    S: ReadStatusRepository + Send + Sync,
    R: PrivateRoomRepository + Send + Sync,
    M: MembershipRepository + Send + Sync,
{
    private_repo: Arc<P>,
    group_repo: Arc<G>,
    read_status_repo: Arc<S>,
    room_repo: Arc<R>,
    membership_repo: Arc<M>,
    hub: Arc<Addr<ConnectionHub>>,
}

impl<P, G, S, R, M> MessageService<P, G, S, R, M>
where
    P: PrivateMessageRepository + Send + Sync,
    G: GroupMessageRepository + Send + Sync,
    S: ReadStatusRepository + Send + Sync,
    R: PrivateRoomRepository + Send + Sync,
    M: MembershipRepository + Send + Sync,
{
    pub fn with_dependencies(
        private_repo: Arc<P>,
        group_repo: Arc<G>,
        read_status_repo: Arc<S>,
        room_repo: Arc<R>,
        membership_repo: Arc<M>,
        hub: Arc<Addr<ConnectionHub>>,
    ) -> Self {
        MessageService { private_repo, group_repo, read_status_repo, room_repo, membership_repo, hub }
    }

    /// Append vào log của private room. Room bị hide "sống lại" ngay
    /// trong cùng transaction: hide không chặn delivery.
    pub async fn append_private(
        &self,
        room_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> Result<PrivateMessageEntity, error::SystemError> {
        let mut tx = self.private_repo.get_pool().begin().await?;

        let message = self
            .private_repo
            .insert(&InsertPrivateMessage { room_id, sender_id, content }, tx.as_mut())
            .await?;

        self.room_repo.clear_hidden(&room_id, tx.as_mut()).await?;

        tx.commit().await?;

        Ok(message)
    }

    /// Append vào log của group. `reply_to` phải trỏ tới message của
    /// cùng group, validate trước khi chấp nhận.
    pub async fn append_group(
        &self,
        group_id: Uuid,
        sender_id: Uuid,
        payload: MessagePayload,
        reply_to_id: Option<Uuid>,
    ) -> Result<AppendedGroupMessage, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let reply_to = match reply_to_id {
            None => None,
            Some(id) => {
                let referenced = self
                    .group_repo
                    .find_by_id(&id, tx.as_mut())
                    .await?
                    .filter(|m| m.group_id == group_id)
                    .ok_or_else(|| {
                        error::SystemError::invalid_operation(
                            "Reply must reference a message in the same group",
                        )
                    })?;
                Some(referenced)
            }
        };

        let row = self
            .group_repo
            .insert(
                &InsertGroupMessage { group_id, sender_id, payload, reply_to_id },
                tx.as_mut(),
            )
            .await?;

        tx.commit().await?;

        Ok(AppendedGroupMessage { message: GroupMessage::try_from(row)?, reply_to })
    }

    /// History của private room, trang mới nhất trước. Mọi message chưa
    /// đọc gửi tới reader được flip sang đã đọc trong cùng lần gọi.
    pub async fn private_history(
        &self,
        room_id: Uuid,
        reader_id: Uuid,
        cursor: Option<String>,
        limit: Option<i32>,
    ) -> Result<PrivateHistoryResponse, error::SystemError> {
        self.require_participant(room_id, reader_id).await?;

        let limit = page_limit(limit);
        let cursor = cursor.map(|c| MessageCursor::decode(&c)).transpose()?;
        let pool = self.private_repo.get_pool();

        let marked_read = self.private_repo.mark_read(&room_id, &reader_id, pool).await?;

        let mut messages =
            self.private_repo.find_page(&room_id, cursor, (limit + 1) as i64, pool).await?;

        let next_cursor = next_cursor(&mut messages, limit, |m| MessageCursor {
            created_at: m.created_at,
            seq: m.seq,
        });

        messages.reverse();

        Ok(PrivateHistoryResponse {
            messages,
            cursor: next_cursor.map(|c| c.encode()),
            marked_read,
        })
    }

    pub async fn group_history(
        &self,
        group_id: Uuid,
        reader_id: Uuid,
        cursor: Option<String>,
        limit: Option<i32>,
    ) -> Result<GroupHistoryResponse, error::SystemError> {
        self.require_member(group_id, reader_id).await?;

        let limit = page_limit(limit);
        let cursor = cursor.map(|c| MessageCursor::decode(&c)).transpose()?;

        let mut rows = self
            .group_repo
            .find_page(&group_id, cursor, (limit + 1) as i64, self.group_repo.get_pool())
            .await?;

        let next_cursor = next_cursor(&mut rows, limit, |m| MessageCursor {
            created_at: m.created_at,
            seq: m.seq,
        });

        rows.reverse();

        let messages =
            rows.into_iter().map(GroupMessage::try_from).collect::<Result<Vec<_>, _>>()?;

        Ok(GroupHistoryResponse { messages, cursor: next_cursor.map(|c| c.encode()) })
    }

    pub async fn mark_private_read(
        &self,
        room_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, error::SystemError> {
        self.require_participant(room_id, reader_id).await?;
        self.private_repo.mark_read(&room_id, &reader_id, self.private_repo.get_pool()).await
    }

    pub async fn mark_group_read(
        &self,
        group_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, error::SystemError> {
        self.require_member(group_id, reader_id).await?;
        self.read_status_repo.mark_read(&group_id, &reader_id, self.group_repo.get_pool()).await
    }

    /// Sender-only edit; các subscriber đang online nhận frame edited.
    pub async fn edit_group_message(
        &self,
        message_id: Uuid,
        actor_id: Uuid,
        new_content: String,
    ) -> Result<GroupMessage, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let existing = self
            .group_repo
            .find_by_id(&message_id, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        if existing.sender_id != Some(actor_id) {
            return Err(error::SystemError::not_authorized(
                "You can only edit your own messages",
            ));
        }

        let edited = self
            .group_repo
            .edit(&message_id, &new_content, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        tx.commit().await?;

        let group_id = edited.group_id;
        let message = GroupMessage::try_from(edited)?;

        self.broadcast_to_group(
            group_id,
            ServerFrame::MessageEdited { message_id, message: new_content },
        )
        .await?;

        Ok(message)
    }

    pub async fn delete_group_message(
        &self,
        message_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let existing = self
            .group_repo
            .find_by_id(&message_id, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        if existing.sender_id != Some(actor_id) {
            return Err(error::SystemError::not_authorized(
                "You can only delete your own messages",
            ));
        }

        self.group_repo.delete(&message_id, tx.as_mut()).await?;

        tx.commit().await?;

        self.broadcast_to_group(existing.group_id, ServerFrame::MessageDeleted { message_id })
            .await?;

        Ok(())
    }

    async fn require_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let room = self
            .room_repo
            .find_by_id(&room_id, self.room_repo.get_pool())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat room does not exist"))?;

        if room.side_of(&user_id).is_none() {
            return Err(error::SystemError::not_authorized(
                "You are not authorized to view this chat",
            ));
        }

        Ok(())
    }

    async fn require_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let member = self
            .membership_repo
            .find_member(&group_id, &user_id, self.group_repo.get_pool())
            .await?;

        if member.is_none() {
            return Err(error::SystemError::not_authorized(
                "You are not a member of this group",
            ));
        }

        Ok(())
    }

    async fn broadcast_to_group(
        &self,
        group_id: Uuid,
        frame: ServerFrame,
    ) -> Result<(), error::SystemError> {
        let member_ids =
            self.membership_repo.member_ids(&group_id, self.group_repo.get_pool()).await?;

        self.hub.do_send(BroadcastToRoom { room_id: group_id, frame, member_ids });

        Ok(())
    }
}

fn page_limit(limit: Option<i32>) -> i32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Cắt trang về `limit` phần tử; nếu còn dư thì cursor là phần tử cuối
/// của trang (keyset `<` sẽ bắt đầu đúng từ phần tử kế tiếp).
fn next_cursor<T>(
    items: &mut Vec<T>,
    limit: i32,
    to_cursor: impl Fn(&T) -> MessageCursor,
) -> Option<MessageCursor> {
    if items.len() > limit as usize {
        items.truncate(limit as usize);
        items.last().map(to_cursor)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    fn cursors(n: i64) -> Vec<MessageCursor> {
        // seq giảm dần như thứ tự DESC trả về từ repository
        (0..n).map(|i| MessageCursor { created_at: chrono::Utc::now(), seq: n - i }).collect()
    }

    #[test]
    fn test_full_page_produces_cursor_of_last_item() {
        let mut items = cursors(4); // limit + 1
        let cursor = next_cursor(&mut items, 3, |c| *c);

        assert_eq!(items.len(), 3);
        // cursor là phần tử cuối của trang đã cắt: trang kế tiếp bắt đầu
        // đúng từ phần tử bị cắt, không bỏ sót message nào
        assert_eq!(cursor.unwrap().seq, items.last().unwrap().seq);
    }

    #[test]
    fn test_short_page_has_no_cursor() {
        let mut items = cursors(2);
        let cursor = next_cursor(&mut items, 3, |c| *c);

        assert_eq!(items.len(), 2);
        assert!(cursor.is_none());
    }

    #[test]
    fn test_page_limit_clamps() {
        assert_eq!(page_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_limit(Some(0)), 1);
        assert_eq!(page_limit(Some(10_000)), MAX_PAGE_SIZE);
        assert_eq!(page_limit(Some(25)), 25);
    }
}
