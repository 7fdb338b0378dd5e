use uuid::Uuid;

use crate::{
    api::error,
    modules::room::{
        model::RoomSummary,
        schema::{ParticipantSide, PrivateRoomEntity},
    },
};

#[async_trait::async_trait]
pub trait PrivateRoomRepository {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres>;

    async fn find_by_id<'e, E>(
        &self,
        room_id: &Uuid,
        tx: E,
    ) -> Result<Option<PrivateRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn find_by_pair<'e, E>(
        &self,
        low: &Uuid,
        high: &Uuid,
        tx: E,
    ) -> Result<Option<PrivateRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// INSERT .. ON CONFLICT DO NOTHING. `None` nghĩa là một resolve khác
    /// vừa thắng race; caller re-select qua `find_by_pair`.
    async fn insert_pair<'e, E>(
        &self,
        low: &Uuid,
        high: &Uuid,
        tx: E,
    ) -> Result<Option<PrivateRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn set_hidden<'e, E>(
        &self,
        room_id: &Uuid,
        side: ParticipantSide,
        tx: E,
    ) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// Gỡ cờ hide cả hai phía (room "sống lại" khi có tin nhắn mới).
    async fn clear_hidden<'e, E>(&self, room_id: &Uuid, tx: E) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn delete<'e, E>(&self, room_id: &Uuid, tx: E) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn find_visible_for_user<'e, E>(
        &self,
        user_id: &Uuid,
        tx: E,
    ) -> Result<Vec<RoomSummary>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn total_unread_for_user<'e, E>(
        &self,
        user_id: &Uuid,
        tx: E,
    ) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;
}
