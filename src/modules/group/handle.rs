use actix_web::{delete, get, post, put, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_extensions,
    modules::{
        group::{
            model::{
                AddMemberBody, CreateGroupBody, GroupDetail, GroupSummary, InvitationDetail,
                InviteBody, SetRoleBody,
            },
            repository_pg::{GroupRepositoryPg, InvitationRepositoryPg, MembershipRepositoryPg},
            schema::{GroupMemberEntity, InvitationEntity},
            service::GroupService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::{Claims, ValidatedJson},
};

pub type GroupSvc = GroupService<
    GroupRepositoryPg,
    MembershipRepositoryPg,
    InvitationRepositoryPg,
    UserRepositoryPg,
>;

#[post("")]
pub async fn create_group(
    group_service: web::Data<GroupSvc>,
    body: ValidatedJson<CreateGroupBody>,
    req: HttpRequest,
) -> Result<success::Success<GroupDetail>, error::Error> {
    let owner_id = get_extensions::<Claims>(&req)?.sub;
    let group = group_service.create_group(owner_id, body.0).await?;

    Ok(success::Success::created(Some(group)))
}

#[get("")]
pub async fn list_groups(
    group_service: web::Data<GroupSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<GroupSummary>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let groups = group_service.list_groups(user_id).await?;

    Ok(success::Success::ok(Some(groups)))
}

#[get("/{group_id}")]
pub async fn get_group(
    group_service: web::Data<GroupSvc>,
    group_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<GroupDetail>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let group = group_service.get_group_detail(*group_id, user_id).await?;

    Ok(success::Success::ok(Some(group)))
}

#[delete("/{group_id}")]
pub async fn delete_group(
    group_service: web::Data<GroupSvc>,
    group_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    group_service.deactivate_group(*group_id, user_id).await?;

    Ok(success::Success::no_content())
}

#[post("/{group_id}/members")]
pub async fn add_member(
    group_service: web::Data<GroupSvc>,
    group_id: web::Path<Uuid>,
    body: ValidatedJson<AddMemberBody>,
    req: HttpRequest,
) -> Result<success::Success<GroupMemberEntity>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let member = group_service.add_member(*group_id, actor_id, body.0.user_id).await?;

    Ok(success::Success::created(Some(member)))
}

#[delete("/{group_id}/members/{user_id}")]
pub async fn remove_member(
    group_service: web::Data<GroupSvc>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let (group_id, target_id) = path.into_inner();
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    group_service.remove_member(group_id, actor_id, target_id).await?;

    Ok(success::Success::no_content())
}

#[post("/{group_id}/leave")]
pub async fn leave_group(
    group_service: web::Data<GroupSvc>,
    group_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    group_service.leave(*group_id, actor_id).await?;

    Ok(success::Success::ok(None).message("You have successfully left the group"))
}

#[put("/{group_id}/members/{user_id}/role")]
pub async fn set_member_role(
    group_service: web::Data<GroupSvc>,
    path: web::Path<(Uuid, Uuid)>,
    body: ValidatedJson<SetRoleBody>,
    req: HttpRequest,
) -> Result<success::Success<GroupMemberEntity>, error::Error> {
    let (group_id, target_id) = path.into_inner();
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let member = group_service
        .set_role(group_id, actor_id, target_id, body.0.role, body.0.can_invite_others)
        .await?;

    Ok(success::Success::ok(Some(member)))
}

#[post("/{group_id}/invitations")]
pub async fn invite_member(
    group_service: web::Data<GroupSvc>,
    group_id: web::Path<Uuid>,
    body: ValidatedJson<InviteBody>,
    req: HttpRequest,
) -> Result<success::Success<InvitationEntity>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let invitation = group_service.invite(*group_id, actor_id, body.0.user_id).await?;

    Ok(success::Success::created(Some(invitation)))
}

#[get("")]
pub async fn list_invitations(
    group_service: web::Data<GroupSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<InvitationDetail>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let invitations = group_service.list_invitations(user_id).await?;

    Ok(success::Success::ok(Some(invitations)))
}

#[post("/{invitation_id}/accept")]
pub async fn accept_invitation(
    group_service: web::Data<GroupSvc>,
    invitation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<GroupMemberEntity>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let member = group_service.accept_invitation(*invitation_id, actor_id).await?;

    Ok(success::Success::ok(Some(member)).message("Invitation accepted"))
}

#[post("/{invitation_id}/decline")]
pub async fn decline_invitation(
    group_service: web::Data<GroupSvc>,
    invitation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    group_service.decline_invitation(*invitation_id, actor_id).await?;

    Ok(success::Success::no_content())
}
