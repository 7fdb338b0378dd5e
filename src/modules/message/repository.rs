use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{
        model::{InsertGroupMessage, InsertPrivateMessage, MessageCursor},
        schema::{GroupMessageRow, PrivateMessageEntity},
    },
};

#[async_trait::async_trait]
pub trait PrivateMessageRepository {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres>;

    async fn insert<'e, E>(
        &self,
        message: &InsertPrivateMessage,
        tx: E,
    ) -> Result<PrivateMessageEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// Trang mới nhất trước `cursor`, DESC, `limit + 1` phần tử để caller
    /// tính next cursor.
    async fn find_page<'e, E>(
        &self,
        room_id: &Uuid,
        cursor: Option<MessageCursor>,
        limit: i64,
        tx: E,
    ) -> Result<Vec<PrivateMessageEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// Đánh dấu đã đọc mọi message chưa đọc không phải do `reader` gửi.
    /// Idempotent: lần gọi thứ hai trả về 0.
    async fn mark_read<'e, E>(
        &self,
        room_id: &Uuid,
        reader_id: &Uuid,
        tx: E,
    ) -> Result<u64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;
}

#[async_trait::async_trait]
pub trait GroupMessageRepository {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres>;

    async fn insert<'e, E>(
        &self,
        message: &InsertGroupMessage,
        tx: E,
    ) -> Result<GroupMessageRow, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn find_by_id<'e, E>(
        &self,
        message_id: &Uuid,
        tx: E,
    ) -> Result<Option<GroupMessageRow>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn find_page<'e, E>(
        &self,
        group_id: &Uuid,
        cursor: Option<MessageCursor>,
        limit: i64,
        tx: E,
    ) -> Result<Vec<GroupMessageRow>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn edit<'e, E>(
        &self,
        message_id: &Uuid,
        new_content: &str,
        tx: E,
    ) -> Result<Option<GroupMessageRow>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// Hard delete; FK `reply_to_id .. ON DELETE SET NULL` giữ các reply
    /// sống sót dưới dạng quote mồ côi.
    async fn delete<'e, E>(&self, message_id: &Uuid, tx: E) -> Result<bool, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;
}

#[async_trait::async_trait]
pub trait ReadStatusRepository {
    /// Ghi read receipt cho mọi message của group mà `reader` chưa đánh
    /// dấu (ON CONFLICT DO NOTHING → idempotent).
    async fn mark_read<'e, E>(
        &self,
        group_id: &Uuid,
        reader_id: &Uuid,
        tx: E,
    ) -> Result<u64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;
}
