use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "group_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Moderator,
    Member,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupRoomEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub max_members: i32,
    pub is_private: bool,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupMemberEntity {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
    pub can_invite_others: bool,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl GroupMemberEntity {
    /// Quyền mời thêm member: admin luôn có, member thường cần cờ riêng.
    pub fn may_invite(&self) -> bool {
        self.role == GroupRole::Admin || self.can_invite_others
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvitationEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub invited_by: Uuid,
    pub invited_user: Uuid,
    pub status: InvitationStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub responded_at: Option<chrono::DateTime<chrono::Utc>>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl InvitationEntity {
    /// Hết hạn được tính lại từ `expires_at` tại thời điểm đọc;
    /// status lưu trong DB không được tin ở thời điểm accept.
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.status == InvitationStatus::Pending && now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn invitation(status: InvitationStatus, expires_in: Duration) -> InvitationEntity {
        let now = Utc::now();
        InvitationEntity {
            id: Uuid::now_v7(),
            group_id: Uuid::now_v7(),
            invited_by: Uuid::now_v7(),
            invited_user: Uuid::now_v7(),
            status,
            created_at: now,
            responded_at: None,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_pending_invitation_past_deadline_is_expired() {
        let inv = invitation(InvitationStatus::Pending, Duration::hours(-1));
        assert!(inv.is_expired(Utc::now()));
    }

    #[test]
    fn test_pending_invitation_before_deadline_is_not_expired() {
        let inv = invitation(InvitationStatus::Pending, Duration::hours(1));
        assert!(!inv.is_expired(Utc::now()));
    }

    #[test]
    fn test_responded_invitation_never_reports_expired() {
        let inv = invitation(InvitationStatus::Accepted, Duration::hours(-1));
        assert!(!inv.is_expired(Utc::now()));
    }

    #[test]
    fn test_admin_may_always_invite() {
        let member = GroupMemberEntity {
            group_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            role: GroupRole::Admin,
            can_invite_others: false,
            joined_at: Utc::now(),
        };
        assert!(member.may_invite());
    }

    #[test]
    fn test_plain_member_needs_invite_flag() {
        let mut member = GroupMemberEntity {
            group_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            role: GroupRole::Member,
            can_invite_others: false,
            joined_at: Utc::now(),
        };
        assert!(!member.may_invite());

        member.can_invite_others = true;
        assert!(member.may_invite());
    }
}
