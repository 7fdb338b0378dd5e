use uuid::Uuid;

use crate::{
    api::error,
    modules::room::{
        model::RoomSummary,
        repository::PrivateRoomRepository,
        schema::{ParticipantSide, PrivateRoomEntity},
    },
};

#[derive(Clone)]
pub struct PrivateRoomRepositoryPg {
    pool: sqlx::PgPool,
}

impl PrivateRoomRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PrivateRoomRepository for PrivateRoomRepositoryPg {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    async fn find_by_id<'e, E>(
        &self,
        room_id: &Uuid,
        tx: E,
    ) -> Result<Option<PrivateRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let room = sqlx::query_as::<_, PrivateRoomEntity>(
            "SELECT * FROM private_rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_optional(tx)
        .await?;

        Ok(room)
    }

    async fn find_by_pair<'e, E>(
        &self,
        low: &Uuid,
        high: &Uuid,
        tx: E,
    ) -> Result<Option<PrivateRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let room = sqlx::query_as::<_, PrivateRoomEntity>(
            "SELECT * FROM private_rooms WHERE participant_low_id = $1 AND participant_high_id = $2",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(tx)
        .await?;

        Ok(room)
    }

    async fn insert_pair<'e, E>(
        &self,
        low: &Uuid,
        high: &Uuid,
        tx: E,
    ) -> Result<Option<PrivateRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let id = Uuid::now_v7();
        let room = sqlx::query_as::<_, PrivateRoomEntity>(
            r#"
            INSERT INTO private_rooms (id, participant_low_id, participant_high_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (participant_low_id, participant_high_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(low)
        .bind(high)
        .fetch_optional(tx)
        .await?;

        Ok(room)
    }

    async fn set_hidden<'e, E>(
        &self,
        room_id: &Uuid,
        side: ParticipantSide,
        tx: E,
    ) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let query = match side {
            ParticipantSide::Low => {
                "UPDATE private_rooms SET hidden_for_low = TRUE WHERE id = $1"
            }
            ParticipantSide::High => {
                "UPDATE private_rooms SET hidden_for_high = TRUE WHERE id = $1"
            }
        };

        sqlx::query(query).bind(room_id).execute(tx).await?;

        Ok(())
    }

    async fn clear_hidden<'e, E>(&self, room_id: &Uuid, tx: E) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE private_rooms
            SET hidden_for_low = FALSE, hidden_for_high = FALSE
            WHERE id = $1
            AND (hidden_for_low OR hidden_for_high)
            "#,
        )
        .bind(room_id)
        .execute(tx)
        .await?;

        Ok(())
    }

    async fn delete<'e, E>(&self, room_id: &Uuid, tx: E) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query("DELETE FROM private_rooms WHERE id = $1").bind(room_id).execute(tx).await?;

        Ok(())
    }

    async fn find_visible_for_user<'e, E>(
        &self,
        user_id: &Uuid,
        tx: E,
    ) -> Result<Vec<RoomSummary>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let rooms = sqlx::query_as::<_, RoomSummary>(
            r#"
            SELECT
                r.id AS room_id,
                u.id AS peer_id,
                u.username AS peer_username,
                u.display_name AS peer_display_name,
                (
                    SELECT COUNT(*)
                    FROM private_messages m
                    WHERE m.room_id = r.id
                    AND m.is_read = FALSE
                    AND m.sender_id <> $1
                ) AS unread_count,
                r.created_at
            FROM private_rooms r
            JOIN users u
                ON u.id = CASE
                    WHEN r.participant_low_id = $1 THEN r.participant_high_id
                    ELSE r.participant_low_id
                END
            WHERE (r.participant_low_id = $1 AND r.hidden_for_low = FALSE)
            OR (r.participant_high_id = $1 AND r.hidden_for_high = FALSE)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(tx)
        .await?;

        Ok(rooms)
    }

    async fn total_unread_for_user<'e, E>(
        &self,
        user_id: &Uuid,
        tx: E,
    ) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM private_messages m
            JOIN private_rooms r ON r.id = m.room_id
            WHERE m.is_read = FALSE
            AND m.sender_id <> $1
            AND (
                (r.participant_low_id = $1 AND r.hidden_for_low = FALSE)
                OR (r.participant_high_id = $1 AND r.hidden_for_high = FALSE)
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(tx)
        .await?;

        Ok(count)
    }
}
