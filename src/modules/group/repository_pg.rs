use uuid::Uuid;

use crate::{
    api::error,
    modules::group::{
        model::{GroupSummary, InvitationDetail, MemberDetail, NewGroup, NewMember},
        repository::{GroupRepository, InvitationRepository, MembershipRepository},
        schema::{GroupMemberEntity, GroupRole, GroupRoomEntity, InvitationEntity, InvitationStatus},
    },
};

#[derive(Clone)]
pub struct GroupRepositoryPg {
    pool: sqlx::PgPool,
}

impl GroupRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GroupRepository for GroupRepositoryPg {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    async fn find_active_by_id<'e, E>(
        &self,
        group_id: &Uuid,
        tx: E,
    ) -> Result<Option<GroupRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let group = sqlx::query_as::<_, GroupRoomEntity>(
            "SELECT * FROM group_rooms WHERE id = $1 AND is_active = TRUE",
        )
        .bind(group_id)
        .fetch_optional(tx)
        .await?;

        Ok(group)
    }

    async fn lock_active_by_id<'e>(
        &self,
        group_id: &Uuid,
        tx: &mut sqlx::Transaction<'e, sqlx::Postgres>,
    ) -> Result<Option<GroupRoomEntity>, error::SystemError> {
        let group = sqlx::query_as::<_, GroupRoomEntity>(
            "SELECT * FROM group_rooms WHERE id = $1 AND is_active = TRUE FOR UPDATE",
        )
        .bind(group_id)
        .fetch_optional(tx.as_mut())
        .await?;

        Ok(group)
    }

    async fn create<'e, E>(
        &self,
        group: &NewGroup,
        tx: E,
    ) -> Result<GroupRoomEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let created = sqlx::query_as::<_, GroupRoomEntity>(
            r#"
            INSERT INTO group_rooms (id, name, description, owner_id, max_members, is_private)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.owner_id)
        .bind(group.max_members)
        .bind(group.is_private)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    async fn deactivate<'e, E>(&self, group_id: &Uuid, tx: E) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            "UPDATE group_rooms SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(group_id)
        .execute(tx)
        .await?;

        Ok(())
    }

    async fn count_active_owned<'e, E>(
        &self,
        owner_id: &Uuid,
        tx: E,
    ) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_rooms WHERE owner_id = $1 AND is_active = TRUE",
        )
        .bind(owner_id)
        .fetch_one(tx)
        .await?;

        Ok(count)
    }

    async fn find_all_for_user<'e, E>(
        &self,
        user_id: &Uuid,
        tx: E,
    ) -> Result<Vec<GroupSummary>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let groups = sqlx::query_as::<_, GroupSummary>(
            r#"
            SELECT
                g.id,
                g.name,
                g.description,
                g.owner_id,
                g.is_private,
                (SELECT COUNT(*) FROM group_members gm WHERE gm.group_id = g.id) AS member_count,
                g.created_at
            FROM group_rooms g
            JOIN group_members m ON m.group_id = g.id AND m.user_id = $1
            WHERE g.is_active = TRUE
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(tx)
        .await?;

        Ok(groups)
    }
}

#[derive(Clone, Default)]
pub struct MembershipRepositoryPg {}

#[async_trait::async_trait]
impl MembershipRepository for MembershipRepositoryPg {
    async fn find_member<'e, E>(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        tx: E,
    ) -> Result<Option<GroupMemberEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let member = sqlx::query_as::<_, GroupMemberEntity>(
            "SELECT * FROM group_members WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(tx)
        .await?;

        Ok(member)
    }

    async fn insert_member<'e, E>(
        &self,
        member: &NewMember,
        tx: E,
    ) -> Result<GroupMemberEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let entity = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            INSERT INTO group_members (group_id, user_id, role, can_invite_others)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(member.group_id)
        .bind(member.user_id)
        .bind(member.role)
        .bind(member.can_invite_others)
        .fetch_one(tx)
        .await?;

        Ok(entity)
    }

    async fn delete_member<'e, E>(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        tx: E,
    ) -> Result<bool, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_role<'e, E>(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        role: GroupRole,
        can_invite_others: Option<bool>,
        tx: E,
    ) -> Result<GroupMemberEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let entity = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            UPDATE group_members
            SET role = $3,
                can_invite_others = COALESCE($4, can_invite_others)
            WHERE group_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .bind(can_invite_others)
        .fetch_one(tx)
        .await?;

        Ok(entity)
    }

    async fn count_members<'e, E>(&self, group_id: &Uuid, tx: E) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(tx)
                .await?;

        Ok(count)
    }

    async fn count_admins<'e, E>(&self, group_id: &Uuid, tx: E) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND role = 'admin'",
        )
        .bind(group_id)
        .fetch_one(tx)
        .await?;

        Ok(count)
    }

    async fn member_ids<'e, E>(&self, group_id: &Uuid, tx: E) -> Result<Vec<Uuid>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM group_members WHERE group_id = $1")
                .bind(group_id)
                .fetch_all(tx)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn member_details<'e, E>(
        &self,
        group_id: &Uuid,
        tx: E,
    ) -> Result<Vec<MemberDetail>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let members = sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT
                m.user_id,
                u.username,
                u.display_name,
                m.role,
                m.can_invite_others,
                m.joined_at
            FROM group_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.group_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(group_id)
        .fetch_all(tx)
        .await?;

        Ok(members)
    }
}

#[derive(Clone, Default)]
pub struct InvitationRepositoryPg {}

#[async_trait::async_trait]
impl InvitationRepository for InvitationRepositoryPg {
    async fn find_by_id<'e, E>(
        &self,
        invitation_id: &Uuid,
        tx: E,
    ) -> Result<Option<InvitationEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let invitation = sqlx::query_as::<_, InvitationEntity>(
            "SELECT * FROM group_invitations WHERE id = $1",
        )
        .bind(invitation_id)
        .fetch_optional(tx)
        .await?;

        Ok(invitation)
    }

    async fn find_for_target<'e, E>(
        &self,
        group_id: &Uuid,
        invited_user: &Uuid,
        tx: E,
    ) -> Result<Option<InvitationEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let invitation = sqlx::query_as::<_, InvitationEntity>(
            "SELECT * FROM group_invitations WHERE group_id = $1 AND invited_user = $2",
        )
        .bind(group_id)
        .bind(invited_user)
        .fetch_optional(tx)
        .await?;

        Ok(invitation)
    }

    async fn insert<'e, E>(
        &self,
        group_id: &Uuid,
        invited_by: &Uuid,
        invited_user: &Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
        tx: E,
    ) -> Result<InvitationEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let id = Uuid::now_v7();
        let invitation = sqlx::query_as::<_, InvitationEntity>(
            r#"
            INSERT INTO group_invitations (id, group_id, invited_by, invited_user, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(group_id)
        .bind(invited_by)
        .bind(invited_user)
        .bind(expires_at)
        .fetch_one(tx)
        .await?;

        Ok(invitation)
    }

    async fn reissue<'e, E>(
        &self,
        invitation_id: &Uuid,
        invited_by: &Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
        tx: E,
    ) -> Result<InvitationEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let invitation = sqlx::query_as::<_, InvitationEntity>(
            r#"
            UPDATE group_invitations
            SET status = 'pending',
                invited_by = $2,
                expires_at = $3,
                created_at = NOW(),
                responded_at = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(invitation_id)
        .bind(invited_by)
        .bind(expires_at)
        .fetch_one(tx)
        .await?;

        Ok(invitation)
    }

    async fn update_status<'e, E>(
        &self,
        invitation_id: &Uuid,
        status: InvitationStatus,
        tx: E,
    ) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            "UPDATE group_invitations SET status = $2, responded_at = NOW() WHERE id = $1",
        )
        .bind(invitation_id)
        .bind(status)
        .execute(tx)
        .await?;

        Ok(())
    }

    async fn list_pending_for_user<'e>(
        &self,
        user_id: &Uuid,
        now: chrono::DateTime<chrono::Utc>,
        tx: &mut sqlx::Transaction<'e, sqlx::Postgres>,
    ) -> Result<Vec<InvitationDetail>, error::SystemError> {
        // Quét lazy: pending quá hạn chuyển thành expired ngay tại lần đọc
        sqlx::query(
            r#"
            UPDATE group_invitations
            SET status = 'expired'
            WHERE invited_user = $1 AND status = 'pending' AND expires_at <= $2
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(tx.as_mut())
        .await?;

        let invitations = sqlx::query_as::<_, InvitationDetail>(
            r#"
            SELECT
                i.id,
                i.group_id,
                g.name AS group_name,
                u.username AS invited_by_username,
                i.status,
                i.created_at,
                i.expires_at
            FROM group_invitations i
            JOIN group_rooms g ON g.id = i.group_id AND g.is_active = TRUE
            JOIN users u ON u.id = i.invited_by
            WHERE i.invited_user = $1 AND i.status = 'pending'
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(tx.as_mut())
        .await?;

        Ok(invitations)
    }
}
