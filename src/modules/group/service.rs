use actix::Addr;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    constants::{GROUP_MAX_MEMBERS, INVITATION_TTL_HOURS, MAX_ACTIVE_GROUPS_PER_OWNER},
    modules::{
        group::{
            model::{
                CreateGroupBody, GroupDetail, GroupSummary, InvitationDetail, MemberDetail,
                NewGroup, NewMember,
            },
            repository::{GroupRepository, InvitationRepository, MembershipRepository},
            schema::{GroupMemberEntity, GroupRole, GroupRoomEntity, InvitationEntity,
                InvitationStatus},
        },
        user::repository::UserRepository,
        websocket::{events::DropFromRoom, hub::ConnectionHub},
    },
};

/// Membership & Role Engine.
///
/// Mọi mutation membership chạy trong một transaction duy nhất, giữ
/// `FOR UPDATE` trên row group để capacity check / role check và insert
/// không bị race giữa các add/remove đồng thời.
#[derive(Clone)]
pub struct GroupService<G, M, I, U>
where
    G: GroupRepository + Send + Sync,
    M: MembershipRepository + Send + Sync,
    I: InvitationRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    group_repo: Arc<G>,
    membership_repo: Arc<M>,
    invitation_repo: Arc<I>,
    user_repo: Arc<U>,
    hub: Arc<Addr<ConnectionHub>>,
}

impl<G, M, I, U> GroupService<G, M, I, U>
where
    G: GroupRepository + Send + Sync,
    M: MembershipRepository + Send + Sync,
    I: InvitationRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(
        group_repo: Arc<G>,
        membership_repo: Arc<M>,
        invitation_repo: Arc<I>,
        user_repo: Arc<U>,
        hub: Arc<Addr<ConnectionHub>>,
    ) -> Self {
        GroupService { group_repo, membership_repo, invitation_repo, user_repo, hub }
    }

    /// Tạo group mới; người tạo trở thành admin với quyền mời.
    pub async fn create_group(
        &self,
        owner_id: Uuid,
        body: CreateGroupBody,
    ) -> Result<GroupDetail, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let owned = self.group_repo.count_active_owned(&owner_id, tx.as_mut()).await?;
        if owned >= MAX_ACTIVE_GROUPS_PER_OWNER {
            return Err(error::SystemError::invalid_operation(format!(
                "You cannot create more than {MAX_ACTIVE_GROUPS_PER_OWNER} active groups"
            )));
        }

        let new_group = NewGroup {
            id: Uuid::now_v7(),
            name: body.name.trim().to_string(),
            description: body.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            owner_id,
            max_members: GROUP_MAX_MEMBERS,
            is_private: body.is_private,
        };

        // Tên trùng (case-insensitive, cùng owner) bật 23505 → Conflict
        let group = self.group_repo.create(&new_group, tx.as_mut()).await?;

        self.membership_repo
            .insert_member(
                &NewMember {
                    group_id: group.id,
                    user_id: owner_id,
                    role: GroupRole::Admin,
                    can_invite_others: true,
                },
                tx.as_mut(),
            )
            .await?;

        let members = self.membership_repo.member_details(&group.id, tx.as_mut()).await?;

        tx.commit().await?;

        tracing::info!("Group {} created by {}", group.id, owner_id);

        Ok(group_detail(group, members))
    }

    pub async fn list_groups(&self, user_id: Uuid) -> Result<Vec<GroupSummary>, error::SystemError> {
        self.group_repo.find_all_for_user(&user_id, self.group_repo.get_pool()).await
    }

    pub async fn get_group_detail(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
    ) -> Result<GroupDetail, error::SystemError> {
        let pool = self.group_repo.get_pool();

        let group = self.resolve_group(group_id).await?;

        if self.membership_repo.find_member(&group_id, &actor_id, pool).await?.is_none() {
            return Err(error::SystemError::not_authorized(
                "You are not a member of this group",
            ));
        }

        let members = self.membership_repo.member_details(&group_id, pool).await?;

        Ok(group_detail(group, members))
    }

    /// Soft delete: group ngừng hoạt động, history giữ nguyên trong DB.
    pub async fn deactivate_group(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let group = self
            .group_repo
            .lock_active_by_id(&group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        if group.owner_id != actor_id {
            return Err(error::SystemError::not_authorized(
                "Only the group creator can delete this group",
            ));
        }

        self.group_repo.deactivate(&group_id, tx.as_mut()).await?;

        tx.commit().await?;

        tracing::info!("Group {} deactivated by {}", group_id, actor_id);

        Ok(())
    }

    /// Room Registry cho group room: chỉ group đang active resolve được.
    pub async fn resolve_group(&self, group_id: Uuid) -> Result<GroupRoomEntity, error::SystemError> {
        self.group_repo
            .find_active_by_id(&group_id, self.group_repo.get_pool())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))
    }

    /// Danh sách member hiện tại: nguồn authority cho authorization
    /// và fan-out.
    pub async fn current_members(&self, group_id: Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        self.resolve_group(group_id).await?;
        self.membership_repo.member_ids(&group_id, self.group_repo.get_pool()).await
    }

    pub async fn is_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        let member = self
            .membership_repo
            .find_member(&group_id, &user_id, self.group_repo.get_pool())
            .await?;
        Ok(member.is_some())
    }

    pub async fn add_member(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<GroupMemberEntity, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let group = self
            .group_repo
            .lock_active_by_id(&group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        let requester = self
            .membership_repo
            .find_member(&group_id, &actor_id, tx.as_mut())
            .await?
            .ok_or_else(|| {
                error::SystemError::not_authorized("You are not a member of this group")
            })?;

        if !requester.may_invite() {
            return Err(error::SystemError::not_authorized(
                "You don't have permission to add members",
            ));
        }

        if self.user_repo.find_by_id(&target_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }

        let member = self.insert_member_checked(&group, target_id, &mut tx).await?;

        tx.commit().await?;

        tracing::info!("User {} added to group {} by {}", target_id, group_id, actor_id);

        Ok(member)
    }

    pub async fn remove_member(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        self.group_repo
            .lock_active_by_id(&group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        let requester = self
            .membership_repo
            .find_member(&group_id, &actor_id, tx.as_mut())
            .await?
            .ok_or_else(|| {
                error::SystemError::not_authorized("You are not a member of this group")
            })?;

        if requester.role != GroupRole::Admin {
            return Err(error::SystemError::not_authorized(
                "Only admins can remove members from this group",
            ));
        }

        if actor_id == target_id {
            return Err(error::SystemError::invalid_operation(
                "You cannot remove yourself from the group",
            ));
        }

        let removed = self.membership_repo.delete_member(&group_id, &target_id, tx.as_mut()).await?;
        if !removed {
            return Err(error::SystemError::not_found("User is not a member of this group"));
        }

        tx.commit().await?;

        // Connection đang mở của member bị gỡ phải ngừng nhận ngay
        self.hub.do_send(DropFromRoom { room_id: group_id, user_id: target_id });

        tracing::info!("User {} removed from group {} by {}", target_id, group_id, actor_id);

        Ok(())
    }

    pub async fn leave(&self, group_id: Uuid, actor_id: Uuid) -> Result<(), error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        self.group_repo
            .lock_active_by_id(&group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        let member = self
            .membership_repo
            .find_member(&group_id, &actor_id, tx.as_mut())
            .await?
            .ok_or_else(|| {
                error::SystemError::not_found("You are not a member of this group")
            })?;

        // Admin cuối cùng không được rời: group luôn phải còn >= 1 admin
        if member.role == GroupRole::Admin {
            let admins = self.membership_repo.count_admins(&group_id, tx.as_mut()).await?;
            if admins <= 1 {
                return Err(error::SystemError::invalid_operation(
                    "You are the only admin. Please assign another admin first",
                ));
            }
        }

        self.membership_repo.delete_member(&group_id, &actor_id, tx.as_mut()).await?;

        tx.commit().await?;

        self.hub.do_send(DropFromRoom { room_id: group_id, user_id: actor_id });

        tracing::info!("User {} left group {}", actor_id, group_id);

        Ok(())
    }

    pub async fn set_role(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        role: GroupRole,
        can_invite_others: Option<bool>,
    ) -> Result<GroupMemberEntity, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        self.group_repo
            .lock_active_by_id(&group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        let requester = self
            .membership_repo
            .find_member(&group_id, &actor_id, tx.as_mut())
            .await?
            .ok_or_else(|| {
                error::SystemError::not_authorized("You are not a member of this group")
            })?;

        if requester.role != GroupRole::Admin {
            return Err(error::SystemError::not_authorized(
                "You don't have permission to update members role",
            ));
        }

        let target = self
            .membership_repo
            .find_member(&group_id, &target_id, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("User is not a member of this group"))?;

        // Hạ cấp admin cuối cùng sẽ để group không còn admin nào
        if target.role == GroupRole::Admin && role != GroupRole::Admin {
            let admins = self.membership_repo.count_admins(&group_id, tx.as_mut()).await?;
            if admins <= 1 {
                return Err(error::SystemError::invalid_operation(
                    "At least one admin must remain in the group",
                ));
            }
        }

        let updated = self
            .membership_repo
            .update_role(&group_id, &target_id, role, can_invite_others, tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn invite(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<InvitationEntity, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let group = self
            .group_repo
            .lock_active_by_id(&group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        let requester = self
            .membership_repo
            .find_member(&group_id, &actor_id, tx.as_mut())
            .await?
            .ok_or_else(|| {
                error::SystemError::not_authorized("You are not a member of this group")
            })?;

        if !requester.may_invite() {
            return Err(error::SystemError::not_authorized(
                "You don't have permission to invite members",
            ));
        }

        if self.user_repo.find_by_id(&target_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }

        if self.membership_repo.find_member(&group_id, &target_id, tx.as_mut()).await?.is_some() {
            return Err(error::SystemError::Conflict(None));
        }

        let count = self.membership_repo.count_members(&group_id, tx.as_mut()).await?;
        if count >= group.max_members as i64 {
            return Err(error::SystemError::capacity_exceeded(
                "This group is full. No more members can be added",
            ));
        }

        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::hours(INVITATION_TTL_HOURS);

        let invitation = match self
            .invitation_repo
            .find_for_target(&group_id, &target_id, tx.as_mut())
            .await?
        {
            None => {
                self.invitation_repo
                    .insert(&group_id, &actor_id, &target_id, expires_at, tx.as_mut())
                    .await?
            }
            Some(existing) if existing.status == InvitationStatus::Pending => {
                if existing.is_expired(now) {
                    self.invitation_repo
                        .reissue(&existing.id, &actor_id, expires_at, tx.as_mut())
                        .await?
                } else {
                    return Err(error::SystemError::Conflict(None));
                }
            }
            // declined/expired: phát hành lại; accepted không tới được đây
            // vì membership check ở trên đã chặn
            Some(existing) => {
                self.invitation_repo
                    .reissue(&existing.id, &actor_id, expires_at, tx.as_mut())
                    .await?
            }
        };

        tx.commit().await?;

        Ok(invitation)
    }

    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        actor_id: Uuid,
    ) -> Result<GroupMemberEntity, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let invitation = self
            .invitation_repo
            .find_by_id(&invitation_id, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Invitation not found"))?;

        if invitation.invited_user != actor_id {
            return Err(error::SystemError::not_authorized(
                "You are not allowed to respond to this invitation",
            ));
        }

        if invitation.status != InvitationStatus::Pending {
            return Err(error::SystemError::invalid_operation(
                "Invitation has already been responded to",
            ));
        }

        // Hết hạn là authoritative tại thời điểm accept, không tin status lưu sẵn
        if invitation.is_expired(chrono::Utc::now()) {
            self.invitation_repo
                .update_status(&invitation_id, InvitationStatus::Expired, tx.as_mut())
                .await?;
            tx.commit().await?;
            return Err(error::SystemError::invalid_operation("Invitation has expired"));
        }

        let group = self
            .group_repo
            .lock_active_by_id(&invitation.group_id, &mut tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        let member = self.insert_member_checked(&group, actor_id, &mut tx).await?;

        self.invitation_repo
            .update_status(&invitation_id, InvitationStatus::Accepted, tx.as_mut())
            .await?;

        tx.commit().await?;

        tracing::info!("User {} accepted invitation to group {}", actor_id, group.id);

        Ok(member)
    }

    pub async fn decline_invitation(
        &self,
        invitation_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let invitation = self
            .invitation_repo
            .find_by_id(&invitation_id, tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Invitation not found"))?;

        if invitation.invited_user != actor_id {
            return Err(error::SystemError::not_authorized(
                "You are not allowed to respond to this invitation",
            ));
        }

        if invitation.status != InvitationStatus::Pending {
            return Err(error::SystemError::invalid_operation(
                "Invitation has already been responded to",
            ));
        }

        self.invitation_repo
            .update_status(&invitation_id, InvitationStatus::Declined, tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn list_invitations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<InvitationDetail>, error::SystemError> {
        let mut tx = self.group_repo.get_pool().begin().await?;

        let invitations = self
            .invitation_repo
            .list_pending_for_user(&user_id, chrono::Utc::now(), &mut tx)
            .await?;

        tx.commit().await?;

        Ok(invitations)
    }

    /// Capacity check + insert trong cùng transaction; caller đã giữ
    /// FOR UPDATE trên row group nên count không thể bị vượt qua bởi
    /// một add đồng thời.
    async fn insert_member_checked<'e>(
        &self,
        group: &GroupRoomEntity,
        user_id: Uuid,
        tx: &mut sqlx::Transaction<'e, sqlx::Postgres>,
    ) -> Result<GroupMemberEntity, error::SystemError> {
        if self.membership_repo.find_member(&group.id, &user_id, tx.as_mut()).await?.is_some() {
            return Err(error::SystemError::Conflict(None));
        }

        let count = self.membership_repo.count_members(&group.id, tx.as_mut()).await?;
        if count >= group.max_members as i64 {
            return Err(error::SystemError::capacity_exceeded(
                "This group is full. No more members can be added",
            ));
        }

        self.membership_repo
            .insert_member(
                &NewMember {
                    group_id: group.id,
                    user_id,
                    role: GroupRole::Member,
                    can_invite_others: false,
                },
                tx.as_mut(),
            )
            .await
    }
}

fn group_detail(group: GroupRoomEntity, members: Vec<MemberDetail>) -> GroupDetail {
    let member_count = members.len() as i64;
    let is_full = member_count >= group.max_members as i64;
    GroupDetail { group, member_count, is_full, members }
}
