use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        room::{
            model::{RoomResponse, RoomSummary},
            repository::PrivateRoomRepository,
            schema::{canonical_pair, PrivateRoomEntity, RoomVisibility},
        },
        user::repository::UserRepository,
    },
};

/// Kết quả của một lần hide: ẩn một phía, hoặc destroy khi cả hai đã ẩn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden,
    Destroyed,
}

/// Room Registry cho private room: resolve cặp canonical, trả lời
/// "ai được nhận event của room này".
#[derive(Clone)]
pub struct RoomService<R, U>
where
    R: PrivateRoomRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    room_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> RoomService<R, U>
where
    R: PrivateRoomRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(room_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        RoomService { room_repo, user_repo }
    }

    /// Tìm hoặc tạo private room giữa hai user.
    ///
    /// Idempotent kể cả khi hai phía gọi đồng thời: thứ tự participant
    /// được canonical hóa trước, unique constraint trên cặp quyết định
    /// ai thắng, phía thua re-select cùng một row.
    pub async fn resolve_private(
        &self,
        actor_id: Uuid,
        other_id: Uuid,
    ) -> Result<RoomResponse, error::SystemError> {
        if actor_id == other_id {
            return Err(error::SystemError::invalid_operation(
                "You cannot start a chat with yourself",
            ));
        }

        if self.user_repo.find_by_id(&other_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }

        let (low, high) = canonical_pair(actor_id, other_id);
        let pool = self.room_repo.get_pool();

        if let Some(room) = self.room_repo.find_by_pair(&low, &high, pool).await? {
            return Ok(room_response(room, false));
        }

        match self.room_repo.insert_pair(&low, &high, pool).await? {
            Some(room) => Ok(room_response(room, true)),
            None => {
                // Thua race với resolve từ phía bên kia
                let room = self
                    .room_repo
                    .find_by_pair(&low, &high, pool)
                    .await?
                    .ok_or_else(|| error::SystemError::not_found("Chat room does not exist"))?;
                Ok(room_response(room, false))
            }
        }
    }

    pub async fn get_room(&self, room_id: Uuid) -> Result<PrivateRoomEntity, error::SystemError> {
        self.room_repo
            .find_by_id(&room_id, self.room_repo.get_pool())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat room does not exist"))
    }

    /// Danh sách member của room, độc lập với cờ hide: room bị ẩn vẫn
    /// nhận tin nhắn mới ("hide, don't leave").
    pub async fn current_members(&self, room_id: Uuid) -> Result<[Uuid; 2], error::SystemError> {
        let room = self.get_room(room_id).await?;
        Ok([room.participant_low_id, room.participant_high_id])
    }

    pub async fn is_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        let room = self.get_room(room_id).await?;
        Ok(room.side_of(&user_id).is_some())
    }

    /// Hide room cho một phía; destroy khi cả hai phía đã hide.
    pub async fn hide_room(
        &self,
        room_id: Uuid,
        actor_id: Uuid,
    ) -> Result<HideOutcome, error::SystemError> {
        let mut tx = self.room_repo.get_pool().begin().await?;

        let room = self
            .room_repo
            .find_by_id(&room_id, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat room does not exist"))?;

        let side = room
            .side_of(&actor_id)
            .ok_or_else(|| {
                error::SystemError::not_authorized("You are not a participant of this chat")
            })?;

        let next = room.visibility().hide(side);

        let outcome = if next == RoomVisibility::Destroyed {
            self.room_repo.delete(&room_id, tx.as_mut()).await?;
            HideOutcome::Destroyed
        } else {
            self.room_repo.set_hidden(&room_id, side, tx.as_mut()).await?;
            HideOutcome::Hidden
        };

        tx.commit().await?;

        Ok(outcome)
    }

    pub async fn list_rooms(&self, user_id: Uuid) -> Result<Vec<RoomSummary>, error::SystemError> {
        self.room_repo.find_visible_for_user(&user_id, self.room_repo.get_pool()).await
    }

    pub async fn total_unread(&self, user_id: Uuid) -> Result<i64, error::SystemError> {
        self.room_repo.total_unread_for_user(&user_id, self.room_repo.get_pool()).await
    }
}

fn room_response(room: PrivateRoomEntity, created: bool) -> RoomResponse {
    RoomResponse {
        room_id: room.id,
        participant_low_id: room.participant_low_id,
        participant_high_id: room.participant_high_id,
        created_at: room.created_at,
        created,
    }
}
