use crate::modules::group::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/groups")
            .service(create_group)
            .service(list_groups)
            .service(get_group)
            .service(delete_group)
            .service(add_member)
            .service(remove_member)
            .service(leave_group)
            .service(set_member_role)
            .service(invite_member),
    )
    .service(
        scope("/invitations")
            .service(list_invitations)
            .service(accept_invitation)
            .service(decline_invitation),
    );
}
