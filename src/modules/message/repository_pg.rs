use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{
        model::{InsertGroupMessage, InsertPrivateMessage, MessageCursor},
        repository::{GroupMessageRepository, PrivateMessageRepository, ReadStatusRepository},
        schema::{GroupMessageRow, PrivateMessageEntity},
    },
};

#[derive(Clone)]
pub struct PrivateMessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl PrivateMessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PrivateMessageRepository for PrivateMessageRepositoryPg {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    async fn insert<'e, E>(
        &self,
        message: &InsertPrivateMessage,
        tx: E,
    ) -> Result<PrivateMessageEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let id = Uuid::now_v7();
        let entity = sqlx::query_as::<_, PrivateMessageEntity>(
            r#"
            INSERT INTO private_messages (id, room_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(message.room_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .fetch_one(tx)
        .await?;

        Ok(entity)
    }

    async fn find_page<'e, E>(
        &self,
        room_id: &Uuid,
        cursor: Option<MessageCursor>,
        limit: i64,
        tx: E,
    ) -> Result<Vec<PrivateMessageEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let messages = if let Some(cursor) = cursor {
            sqlx::query_as::<_, PrivateMessageEntity>(
                r#"
                SELECT * FROM private_messages
                WHERE room_id = $1 AND (created_at, seq) < ($2, $3)
                ORDER BY created_at DESC, seq DESC
                LIMIT $4
                "#,
            )
            .bind(room_id)
            .bind(cursor.created_at)
            .bind(cursor.seq)
            .bind(limit)
            .fetch_all(tx)
            .await?
        } else {
            sqlx::query_as::<_, PrivateMessageEntity>(
                r#"
                SELECT * FROM private_messages
                WHERE room_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
                "#,
            )
            .bind(room_id)
            .bind(limit)
            .fetch_all(tx)
            .await?
        };

        Ok(messages)
    }

    async fn mark_read<'e, E>(
        &self,
        room_id: &Uuid,
        reader_id: &Uuid,
        tx: E,
    ) -> Result<u64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE private_messages
            SET is_read = TRUE
            WHERE room_id = $1 AND is_read = FALSE AND sender_id <> $2
            "#,
        )
        .bind(room_id)
        .bind(reader_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct GroupMessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl GroupMessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GroupMessageRepository for GroupMessageRepositoryPg {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    async fn insert<'e, E>(
        &self,
        message: &InsertGroupMessage,
        tx: E,
    ) -> Result<GroupMessageRow, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let id = Uuid::now_v7();
        let row = sqlx::query_as::<_, GroupMessageRow>(
            r#"
            INSERT INTO group_messages
                (id, group_id, sender_id, kind, content, attachment_url, reply_to_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(message.group_id)
        .bind(message.sender_id)
        .bind(message.payload.kind())
        .bind(message.payload.content())
        .bind(message.payload.attachment_url())
        .bind(message.reply_to_id)
        .fetch_one(tx)
        .await?;

        Ok(row)
    }

    async fn find_by_id<'e, E>(
        &self,
        message_id: &Uuid,
        tx: E,
    ) -> Result<Option<GroupMessageRow>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let row =
            sqlx::query_as::<_, GroupMessageRow>("SELECT * FROM group_messages WHERE id = $1")
                .bind(message_id)
                .fetch_optional(tx)
                .await?;

        Ok(row)
    }

    async fn find_page<'e, E>(
        &self,
        group_id: &Uuid,
        cursor: Option<MessageCursor>,
        limit: i64,
        tx: E,
    ) -> Result<Vec<GroupMessageRow>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let rows = if let Some(cursor) = cursor {
            sqlx::query_as::<_, GroupMessageRow>(
                r#"
                SELECT * FROM group_messages
                WHERE group_id = $1 AND (created_at, seq) < ($2, $3)
                ORDER BY created_at DESC, seq DESC
                LIMIT $4
                "#,
            )
            .bind(group_id)
            .bind(cursor.created_at)
            .bind(cursor.seq)
            .bind(limit)
            .fetch_all(tx)
            .await?
        } else {
            sqlx::query_as::<_, GroupMessageRow>(
                r#"
                SELECT * FROM group_messages
                WHERE group_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
                "#,
            )
            .bind(group_id)
            .bind(limit)
            .fetch_all(tx)
            .await?
        };

        Ok(rows)
    }

    async fn edit<'e, E>(
        &self,
        message_id: &Uuid,
        new_content: &str,
        tx: E,
    ) -> Result<Option<GroupMessageRow>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let row = sqlx::query_as::<_, GroupMessageRow>(
            r#"
            UPDATE group_messages
            SET content = $2, is_edited = TRUE, edited_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(message_id)
        .bind(new_content)
        .fetch_optional(tx)
        .await?;

        Ok(row)
    }

    async fn delete<'e, E>(&self, message_id: &Uuid, tx: E) -> Result<bool, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query("DELETE FROM group_messages WHERE id = $1")
            .bind(message_id)
            .execute(tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone, Default)]
pub struct ReadStatusRepositoryPg {}

#[async_trait::async_trait]
impl ReadStatusRepository for ReadStatusRepositoryPg {
    async fn mark_read<'e, E>(
        &self,
        group_id: &Uuid,
        reader_id: &Uuid,
        tx: E,
    ) -> Result<u64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO group_read_statuses (message_id, user_id)
            SELECT m.id, $2
            FROM group_messages m
            WHERE m.group_id = $1
            AND (m.sender_id IS NULL OR m.sender_id <> $2)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(reader_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }
}
