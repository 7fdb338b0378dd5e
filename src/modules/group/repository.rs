use uuid::Uuid;

use crate::{
    api::error,
    modules::group::{
        model::{GroupSummary, InvitationDetail, MemberDetail, NewGroup, NewMember},
        schema::{GroupMemberEntity, GroupRole, GroupRoomEntity, InvitationEntity, InvitationStatus},
    },
};

#[async_trait::async_trait]
pub trait GroupRepository {
    fn get_pool(&self) -> &sqlx::Pool<sqlx::Postgres>;

    async fn find_active_by_id<'e, E>(
        &self,
        group_id: &Uuid,
        tx: E,
    ) -> Result<Option<GroupRoomEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// SELECT .. FOR UPDATE: mọi mutation membership giữ lock trên row
    /// group để capacity/role check và insert nằm trong cùng atomic unit.
    async fn lock_active_by_id<'e>(
        &self,
        group_id: &Uuid,
        tx: &mut sqlx::Transaction<'e, sqlx::Postgres>,
    ) -> Result<Option<GroupRoomEntity>, error::SystemError>;

    async fn create<'e, E>(
        &self,
        group: &NewGroup,
        tx: E,
    ) -> Result<GroupRoomEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn deactivate<'e, E>(&self, group_id: &Uuid, tx: E) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn count_active_owned<'e, E>(
        &self,
        owner_id: &Uuid,
        tx: E,
    ) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn find_all_for_user<'e, E>(
        &self,
        user_id: &Uuid,
        tx: E,
    ) -> Result<Vec<GroupSummary>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;
}

#[async_trait::async_trait]
pub trait MembershipRepository {
    async fn find_member<'e, E>(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        tx: E,
    ) -> Result<Option<GroupMemberEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn insert_member<'e, E>(
        &self,
        member: &NewMember,
        tx: E,
    ) -> Result<GroupMemberEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn delete_member<'e, E>(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        tx: E,
    ) -> Result<bool, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn update_role<'e, E>(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        role: GroupRole,
        can_invite_others: Option<bool>,
        tx: E,
    ) -> Result<GroupMemberEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn count_members<'e, E>(
        &self,
        group_id: &Uuid,
        tx: E,
    ) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn count_admins<'e, E>(&self, group_id: &Uuid, tx: E) -> Result<i64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn member_ids<'e, E>(
        &self,
        group_id: &Uuid,
        tx: E,
    ) -> Result<Vec<Uuid>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn member_details<'e, E>(
        &self,
        group_id: &Uuid,
        tx: E,
    ) -> Result<Vec<MemberDetail>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;
}

#[async_trait::async_trait]
pub trait InvitationRepository {
    async fn find_by_id<'e, E>(
        &self,
        invitation_id: &Uuid,
        tx: E,
    ) -> Result<Option<InvitationEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn find_for_target<'e, E>(
        &self,
        group_id: &Uuid,
        invited_user: &Uuid,
        tx: E,
    ) -> Result<Option<InvitationEntity>, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn insert<'e, E>(
        &self,
        group_id: &Uuid,
        invited_by: &Uuid,
        invited_user: &Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
        tx: E,
    ) -> Result<InvitationEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// Phát hành lại một lời mời đã expired/declined: đưa row về pending
    /// với hạn mới (unique key trên (group, invited_user) giữ nguyên).
    async fn reissue<'e, E>(
        &self,
        invitation_id: &Uuid,
        invited_by: &Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
        tx: E,
    ) -> Result<InvitationEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    async fn update_status<'e, E>(
        &self,
        invitation_id: &Uuid,
        status: InvitationStatus,
        tx: E,
    ) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>;

    /// Quét lazy các lời mời pending đã quá hạn của user rồi trả về danh
    /// sách còn pending thực sự.
    async fn list_pending_for_user<'e>(
        &self,
        user_id: &Uuid,
        now: chrono::DateTime<chrono::Utc>,
        tx: &mut sqlx::Transaction<'e, sqlx::Postgres>,
    ) -> Result<Vec<InvitationDetail>, error::SystemError>;
}
