use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::modules::group::schema::{GroupRole, GroupRoomEntity, InvitationStatus};

fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    // đếm ký tự, không đếm byte: tên tiếng Việt có dấu vẫn tính đúng
    let char_count = trimmed.chars().count();
    if !(2..=20).contains(&char_count) {
        return Err(ValidationError::new("length")
            .with_message("Group name must be between 2 and 20 characters".into()));
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("numeric")
            .with_message("Group name cannot be purely numeric".into()));
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupBody {
    #[validate(custom(function = "validate_group_name"))]
    pub name: String,
    #[validate(length(max = 300, message = "Description cannot exceed 300 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddMemberBody {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetRoleBody {
    pub role: GroupRole,
    pub can_invite_others: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteBody {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberDetail {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: GroupRole,
    pub can_invite_others: bool,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: GroupRoomEntity,
    pub member_count: i64,
    pub is_full: bool,
    pub members: Vec<MemberDetail>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub is_private: bool,
    pub member_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Lời mời kèm tên group và người mời, trả về cho người được mời.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvitationDetail {
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub invited_by_username: String,
    pub status: InvitationStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub max_members: i32,
    pub is_private: bool,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
    pub can_invite_others: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(name: &str) -> CreateGroupBody {
        CreateGroupBody { name: name.to_string(), description: None, is_private: false }
    }

    #[test]
    fn test_group_name_length_bounds() {
        assert!(body("a").validate().is_err());
        assert!(body("ab").validate().is_ok());
        assert!(body("a".repeat(20).as_str()).validate().is_ok());
        assert!(body("a".repeat(21).as_str()).validate().is_err());
    }

    #[test]
    fn test_purely_numeric_name_is_rejected() {
        assert!(body("12345").validate().is_err());
        // chữ số kèm chữ cái thì hợp lệ
        assert!(body("team 42").validate().is_ok());
    }

    #[test]
    fn test_description_limit() {
        let mut b = body("team");
        b.description = Some("d".repeat(300));
        assert!(b.validate().is_ok());

        b.description = Some("d".repeat(301));
        assert!(b.validate().is_err());
    }
}
