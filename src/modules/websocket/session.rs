/// WebSocket Session Actor
///
/// Mỗi connection có một session actor riêng, giữ principal đã verify
/// và room đích từ handshake. Inbound frame được forward qua Event
/// Router; outbound frame đi qua mpsc channel bridge về handler.rs.
use actix::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::error;

use super::events::{CloseSession, Connect, Disconnect};
use super::hub::ConnectionHub;
use super::protocol::{ClientFrame, ServerFrame};
use super::router::{EventRouter, RoomTarget};

pub struct WsSession {
    pub id: Uuid,

    /// Principal đã được verify lúc handshake; session không bao giờ
    /// tồn tại ở trạng thái chưa xác thực.
    pub user_id: Uuid,

    /// Room mà connection này subscribe (từ path).
    pub target: RoomTarget,

    pub hub: Addr<ConnectionHub>,

    /// Channel đẩy JSON về client (bridge → handler.rs → WebSocket)
    pub tx: mpsc::UnboundedSender<String>,

    pub router: EventRouter,
}

impl WsSession {
    pub fn new(
        user_id: Uuid,
        target: RoomTarget,
        hub: Addr<ConnectionHub>,
        tx: mpsc::UnboundedSender<String>,
        router: EventRouter,
    ) -> Self {
        Self { id: Uuid::now_v7(), user_id, target, hub, tx, router }
    }

    fn send_to_client(&self, frame: &ServerFrame) {
        match serde_json::to_string(frame) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!(
                        "Không thể gửi frame tới client (session {}): {}",
                        self.id,
                        e
                    );
                }
            }
            Err(e) => {
                tracing::error!("Không thể serialize ServerFrame (session {}): {}", self.id, e);
            }
        }
    }
}

impl Actor for WsSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("WebSocket session started: {}", self.id);

        self.hub.do_send(Connect {
            session_id: self.id,
            user_id: self.user_id,
            room_id: self.target.room_id(),
            addr: ctx.address(),
        });
    }

    // Chạy trên mọi đường thoát, kể cả termination bất thường:
    // hub luôn được deregister.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("WebSocket session stopped: {}", self.id);

        self.hub.do_send(Disconnect { session_id: self.id });
    }
}

/// Inbound frame từ bridge loop: đẩy qua Event Router. Lỗi pipeline
/// (rejected/failed) chỉ quay về connection này, không broadcast.
impl Handler<ClientFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, frame: ClientFrame, ctx: &mut Context<Self>) {
        let router = self.router.clone();
        let target = self.target;
        let user_id = self.user_id;
        let session_id = self.id;
        let tx = self.tx.clone();

        ctx.spawn(
            async move {
                if let Err(e) = router.dispatch(target, user_id, frame).await {
                    tracing::debug!("Event rejected (session {}): {}", session_id, e);

                    let message = error::Error::from(e).to_string();
                    let err_frame = ServerFrame::Error { message };
                    if let Ok(json) = serde_json::to_string(&err_frame) {
                        let _ = tx.send(json);
                    }
                }
            }
            .into_actor(self),
        );
    }
}

/// Frame fan-out từ hub → serialize → client.
impl Handler<ServerFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, frame: ServerFrame, _ctx: &mut Context<Self>) {
        self.send_to_client(&frame);
    }
}

impl Handler<CloseSession> for WsSession {
    type Result = ();

    fn handle(&mut self, _: CloseSession, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
