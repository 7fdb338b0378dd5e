/// WebSocket Actor Events
///
/// Messages trao đổi giữa session actors và Connection Hub.
use actix::prelude::*;
use uuid::Uuid;

use super::protocol::ServerFrame;
use super::session::WsSession;

/// Session mới đã qua handshake (principal + membership đã verify),
/// đăng ký vào fan-out group của room.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub addr: Addr<WsSession>,
}

/// Session rời hub. An toàn khi gửi nhiều lần.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub session_id: Uuid,
}

/// Fan-out một frame tới mọi session đang subscribe room.
/// `member_ids` là danh sách member hiện tại của room (từ Room Registry);
/// member không có session nào được chuyển cho Notifier.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct BroadcastToRoom {
    pub room_id: Uuid,
    pub frame: ServerFrame,
    pub member_ids: Vec<Uuid>,
}

/// Gỡ mọi session của một user khỏi fan-out group của room
/// (membership vừa bị thu hồi).
#[derive(Message)]
#[rtype(result = "()")]
pub struct DropFromRoom {
    pub room_id: Uuid,
    pub user_id: Uuid,
}

/// Yêu cầu session actor dừng hẳn (bridge loop đã kết thúc).
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSession;

/// ServerFrame được gửi thẳng tới session actor để đẩy xuống client.
impl Message for ServerFrame {
    type Result = ();
}

/// ClientFrame đã parse, forward từ bridge loop sang session actor.
impl Message for super::protocol::ClientFrame {
    type Result = ();
}
