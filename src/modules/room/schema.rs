use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct PrivateRoomEntity {
    pub id: Uuid,
    pub participant_low_id: Uuid,
    pub participant_high_id: Uuid,
    pub hidden_for_low: bool,
    pub hidden_for_high: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Phía của một participant trong cặp đã canonical hóa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantSide {
    Low,
    High,
}

/// Trạng thái hiển thị của một private room. Destroyed là transition
/// không thể đảo ngược duy nhất, chỉ đạt được khi cả hai phía đã hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomVisibility {
    VisibleToBoth,
    HiddenByLow,
    HiddenByHigh,
    Destroyed,
}

impl RoomVisibility {
    pub fn from_flags(hidden_for_low: bool, hidden_for_high: bool) -> Self {
        match (hidden_for_low, hidden_for_high) {
            (false, false) => RoomVisibility::VisibleToBoth,
            (true, false) => RoomVisibility::HiddenByLow,
            (false, true) => RoomVisibility::HiddenByHigh,
            (true, true) => RoomVisibility::Destroyed,
        }
    }

    /// Trạng thái sau khi một phía hide. Hide là idempotent.
    pub fn hide(self, side: ParticipantSide) -> Self {
        match (self, side) {
            (RoomVisibility::VisibleToBoth, ParticipantSide::Low) => RoomVisibility::HiddenByLow,
            (RoomVisibility::VisibleToBoth, ParticipantSide::High) => RoomVisibility::HiddenByHigh,
            (RoomVisibility::HiddenByLow, ParticipantSide::High) => RoomVisibility::Destroyed,
            (RoomVisibility::HiddenByHigh, ParticipantSide::Low) => RoomVisibility::Destroyed,
            (state, _) => state,
        }
    }
}

impl PrivateRoomEntity {
    pub fn side_of(&self, user_id: &Uuid) -> Option<ParticipantSide> {
        if *user_id == self.participant_low_id {
            Some(ParticipantSide::Low)
        } else if *user_id == self.participant_high_id {
            Some(ParticipantSide::High)
        } else {
            None
        }
    }

    pub fn visibility(&self) -> RoomVisibility {
        RoomVisibility::from_flags(self.hidden_for_low, self.hidden_for_high)
    }
}

/// Cặp participant đã canonical hóa: (A,B) và (B,A) cho ra cùng một khóa.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_is_order_independent() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
        let (low, high) = canonical_pair(a, b);
        assert!(low < high);
    }

    #[test]
    fn test_destroyed_only_from_both_hidden() {
        let state = RoomVisibility::VisibleToBoth;

        let after_low = state.hide(ParticipantSide::Low);
        assert_eq!(after_low, RoomVisibility::HiddenByLow);

        // một phía hide không bao giờ đủ để destroy
        assert_ne!(after_low, RoomVisibility::Destroyed);

        let after_both = after_low.hide(ParticipantSide::High);
        assert_eq!(after_both, RoomVisibility::Destroyed);
    }

    #[test]
    fn test_hide_is_idempotent() {
        let state = RoomVisibility::VisibleToBoth.hide(ParticipantSide::Low);
        assert_eq!(state.hide(ParticipantSide::Low), state);
    }

    #[test]
    fn test_side_of_non_participant_is_none() {
        let low = Uuid::now_v7();
        let high = Uuid::now_v7();
        let (low, high) = canonical_pair(low, high);

        let room = PrivateRoomEntity {
            id: Uuid::now_v7(),
            participant_low_id: low,
            participant_high_id: high,
            hidden_for_low: false,
            hidden_for_high: false,
            created_at: chrono::Utc::now(),
        };

        assert_eq!(room.side_of(&low), Some(ParticipantSide::Low));
        assert_eq!(room.side_of(&high), Some(ParticipantSide::High));
        assert_eq!(room.side_of(&Uuid::now_v7()), None);
    }
}
