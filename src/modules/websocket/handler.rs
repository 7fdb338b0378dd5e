/// WebSocket HTTP Handler
///
/// Upgrade HTTP → WebSocket với authorization TRƯỚC handshake: token
/// trong query string được verify, room resolve, membership check.
/// Fail ở bước nào thì connection đóng bằng HTTP error, không một frame
/// nào được trao đổi.
///
/// - Inbound:  Client → WebSocket → parse ClientFrame → Session Actor
/// - Outbound: Hub → Session Actor → mpsc channel → WebSocket → Client
use actix::{Actor, Addr};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{group::handle::GroupSvc, room::handle::RoomSvc},
    utils::Claims,
    ENV,
};

use super::events::CloseSession;
use super::hub::ConnectionHub;
use super::protocol::ClientFrame;
use super::router::{EventRouter, RoomTarget};
use super::session::WsSession;

/// Token nằm trong query string: WebSocket handshake từ browser không
/// gắn được Authorization header.
#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

fn verify_token(query: &WsAuthQuery) -> Result<Claims, error::Error> {
    Claims::decode(&query.token, ENV.jwt_secret.as_ref())
        .map_err(|_| error::Error::unauthenticated("Token invalid or expired"))
}

/// GET /ws/chat/{room_id}?token=...
#[get("/chat/{room_id}")]
pub async fn private_ws(
    req: HttpRequest,
    stream: web::Payload,
    room_id: web::Path<Uuid>,
    query: web::Query<WsAuthQuery>,
    room_service: web::Data<RoomSvc>,
    hub: web::Data<Addr<ConnectionHub>>,
    router: web::Data<EventRouter>,
) -> Result<HttpResponse, Error> {
    let claims = verify_token(&query)?;

    let members = room_service
        .current_members(*room_id)
        .await
        .map_err(error::Error::from)?;

    if !members.contains(&claims.sub) {
        tracing::warn!("User {} not authorized for room {}", claims.sub, room_id);
        return Err(error::Error::not_authorized("You are not a participant of this chat").into());
    }

    start_session(req, stream, claims.sub, RoomTarget::Private(*room_id), &hub, &router)
}

/// GET /ws/group/{group_id}?token=...
#[get("/group/{group_id}")]
pub async fn group_ws(
    req: HttpRequest,
    stream: web::Payload,
    group_id: web::Path<Uuid>,
    query: web::Query<WsAuthQuery>,
    group_service: web::Data<GroupSvc>,
    hub: web::Data<Addr<ConnectionHub>>,
    router: web::Data<EventRouter>,
) -> Result<HttpResponse, Error> {
    let claims = verify_token(&query)?;

    // resolve_group fail khi group không tồn tại hoặc đã deactivate
    group_service.resolve_group(*group_id).await.map_err(error::Error::from)?;

    if !group_service.is_member(*group_id, claims.sub).await.map_err(error::Error::from)? {
        tracing::warn!("User {} not authorized for group {}", claims.sub, group_id);
        return Err(error::Error::not_authorized("You are not a member of this group").into());
    }

    start_session(req, stream, claims.sub, RoomTarget::Group(*group_id), &hub, &router)
}

fn start_session(
    req: HttpRequest,
    stream: web::Payload,
    user_id: Uuid,
    target: RoomTarget,
    hub: &web::Data<Addr<ConnectionHub>>,
    router: &web::Data<EventRouter>,
) -> Result<HttpResponse, Error> {
    tracing::debug!("WebSocket upgrade request từ {:?}", req.peer_addr());

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    // mpsc channel: session actor gửi JSON → spawned task → client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let addr = WsSession::new(
        user_id,
        target,
        hub.get_ref().clone(),
        tx,
        router.get_ref().clone(),
    )
    .start();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                // === INBOUND: Client → Server ===
                msg = msg_stream.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let text_str = text.to_string();

                            match serde_json::from_str::<ClientFrame>(&text_str) {
                                Ok(frame) => {
                                    addr.do_send(frame);
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        "Không thể parse client frame: {} - raw: {}",
                                        e,
                                        &text_str[..100.min(text_str.len())]
                                    );
                                }
                            }
                        }

                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_session.pong(&data).await {
                                tracing::error!("Không thể gửi pong: {}", e);
                                break;
                            }
                        }

                        Some(Ok(Message::Pong(_))) => {
                            // Heartbeat response - bỏ qua
                        }

                        Some(Ok(Message::Close(reason))) => {
                            tracing::info!("WebSocket close frame: {:?}", reason);
                            break;
                        }

                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!("Binary frame không được hỗ trợ");
                        }

                        Some(Ok(Message::Continuation(_) | Message::Nop)) => {}

                        Some(Err(e)) => {
                            tracing::error!("WebSocket protocol error: {}", e);
                            break;
                        }

                        // Stream kết thúc (client disconnect)
                        None => break,
                    }
                }

                // === OUTBOUND: Server → Client ===
                Some(json) = rx.recv() => {
                    if ws_session.text(json).await.is_err() {
                        tracing::error!("Không thể gửi frame tới WebSocket client");
                        break;
                    }
                }
            }
        }

        // Cleanup trên mọi đường thoát: actor dừng → stopped() →
        // hub deregister trước khi broadcast tiếp theo nhìn thấy session
        addr.do_send(CloseSession);
        let _ = ws_session.close(None).await;
        tracing::debug!("WebSocket message loop kết thúc");
    });

    tracing::info!("WebSocket connection established (user {})", user_id);
    Ok(response)
}
