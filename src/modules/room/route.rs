use crate::modules::room::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/chats")
            .service(unread_count)
            .service(start_chat)
            .service(list_chats)
            .service(hide_chat),
    );
}
