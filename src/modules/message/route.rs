use crate::modules::message::handle::*;
use actix_web::web::ServiceConfig;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(private_history)
        .service(group_history)
        .service(mark_private_read)
        .service(mark_group_read)
        .service(edit_message)
        .service(delete_message);
}
