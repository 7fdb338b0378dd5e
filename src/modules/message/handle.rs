use actix_web::{delete, get, post, put, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_extensions,
    modules::{
        group::repository_pg::MembershipRepositoryPg,
        message::{
            model::{
                EditMessageBody, GroupHistoryResponse, HistoryQuery, MarkReadResponse,
                PrivateHistoryResponse,
            },
            repository_pg::{
                GroupMessageRepositoryPg, PrivateMessageRepositoryPg, ReadStatusRepositoryPg,
            },
            schema::GroupMessage,
            service::MessageService,
        },
        room::repository_pg::PrivateRoomRepositoryPg,
    },
    utils::{Claims, ValidatedJson, ValidatedQuery},
};

pub type MessageSvc = MessageService<
    PrivateMessageRepositoryPg,
    GroupMessageRepositoryPg,
    ReadStatusRepositoryPg,
    PrivateRoomRepositoryPg,
    MembershipRepositoryPg,
>;

#[get("/chats/{room_id}/messages")]
pub async fn private_history(
    message_service: web::Data<MessageSvc>,
    room_id: web::Path<Uuid>,
    query: ValidatedQuery<HistoryQuery>,
    req: HttpRequest,
) -> Result<success::Success<PrivateHistoryResponse>, error::Error> {
    let reader_id = get_extensions::<Claims>(&req)?.sub;
    let history = message_service
        .private_history(*room_id, reader_id, query.0.cursor, query.0.limit)
        .await?;

    Ok(success::Success::ok(Some(history)))
}

#[get("/groups/{group_id}/messages")]
pub async fn group_history(
    message_service: web::Data<MessageSvc>,
    group_id: web::Path<Uuid>,
    query: ValidatedQuery<HistoryQuery>,
    req: HttpRequest,
) -> Result<success::Success<GroupHistoryResponse>, error::Error> {
    let reader_id = get_extensions::<Claims>(&req)?.sub;
    let history =
        message_service.group_history(*group_id, reader_id, query.0.cursor, query.0.limit).await?;

    Ok(success::Success::ok(Some(history)))
}

#[post("/chats/{room_id}/messages/read")]
pub async fn mark_private_read(
    message_service: web::Data<MessageSvc>,
    room_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<MarkReadResponse>, error::Error> {
    let reader_id = get_extensions::<Claims>(&req)?.sub;
    let marked_read = message_service.mark_private_read(*room_id, reader_id).await?;

    Ok(success::Success::ok(Some(MarkReadResponse { marked_read })))
}

#[post("/groups/{group_id}/messages/read")]
pub async fn mark_group_read(
    message_service: web::Data<MessageSvc>,
    group_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<MarkReadResponse>, error::Error> {
    let reader_id = get_extensions::<Claims>(&req)?.sub;
    let marked_read = message_service.mark_group_read(*group_id, reader_id).await?;

    Ok(success::Success::ok(Some(MarkReadResponse { marked_read })))
}

#[put("/messages/{message_id}")]
pub async fn edit_message(
    message_service: web::Data<MessageSvc>,
    message_id: web::Path<Uuid>,
    body: ValidatedJson<EditMessageBody>,
    req: HttpRequest,
) -> Result<success::Success<GroupMessage>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let message =
        message_service.edit_group_message(*message_id, actor_id, body.0.content).await?;

    Ok(success::Success::ok(Some(message)))
}

#[delete("/messages/{message_id}")]
pub async fn delete_message(
    message_service: web::Data<MessageSvc>,
    message_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    message_service.delete_group_message(*message_id, actor_id).await?;

    Ok(success::Success::no_content())
}
