use actix_web::{delete, get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_extensions,
    modules::{
        room::{
            model::{RoomResponse, RoomSummary, StartChatBody, UnreadCountResponse},
            repository_pg::PrivateRoomRepositoryPg,
            service::{HideOutcome, RoomService},
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::{Claims, ValidatedJson},
};

pub type RoomSvc = RoomService<PrivateRoomRepositoryPg, UserRepositoryPg>;

#[post("")]
pub async fn start_chat(
    room_service: web::Data<RoomSvc>,
    body: ValidatedJson<StartChatBody>,
    req: HttpRequest,
) -> Result<success::Success<RoomResponse>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let room = room_service.resolve_private(actor_id, body.0.user_id).await?;

    if room.created {
        Ok(success::Success::created(Some(room)))
    } else {
        Ok(success::Success::ok(Some(room)))
    }
}

#[get("")]
pub async fn list_chats(
    room_service: web::Data<RoomSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<RoomSummary>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let rooms = room_service.list_rooms(user_id).await?;

    Ok(success::Success::ok(Some(rooms)))
}

#[get("/unread-count")]
pub async fn unread_count(
    room_service: web::Data<RoomSvc>,
    req: HttpRequest,
) -> Result<success::Success<UnreadCountResponse>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let total_unread = room_service.total_unread(user_id).await?;

    Ok(success::Success::ok(Some(UnreadCountResponse { total_unread })))
}

#[delete("/{room_id}")]
pub async fn hide_chat(
    room_service: web::Data<RoomSvc>,
    room_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;

    match room_service.hide_room(*room_id, actor_id).await? {
        HideOutcome::Destroyed => Ok(success::Success::no_content()),
        HideOutcome::Hidden => Ok(success::Success::ok(None).message("Chat hidden for you")),
    }
}
