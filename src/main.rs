use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::authentication,
    modules::{
        attachment::{
            model::UploadConfig,
            storage::{BlobStorage, DiskBlobStorage},
        },
        group::{
            repository_pg::{GroupRepositoryPg, InvitationRepositoryPg, MembershipRepositoryPg},
            service::GroupService,
        },
        message::{
            repository_pg::{
                GroupMessageRepositoryPg, PrivateMessageRepositoryPg, ReadStatusRepositoryPg,
            },
            service::MessageService,
        },
        notify::notifier::LogNotifier,
        room::{repository_pg::PrivateRoomRepositoryPg, service::RoomService},
        user::{repository_pg::UserRepositoryPg, service::UserService},
        websocket::{handler, hub::ConnectionHub, router::EventRouter},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|_| std::io::Error::other("Database migration error"))?;

    let redis_pool =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let room_repo = PrivateRoomRepositoryPg::new(db_pool.clone());
    let group_repo = GroupRepositoryPg::new(db_pool.clone());
    let membership_repo = MembershipRepositoryPg::default();
    let invitation_repo = InvitationRepositoryPg::default();
    let private_message_repo = PrivateMessageRepositoryPg::new(db_pool.clone());
    let group_message_repo = GroupMessageRepositoryPg::new(db_pool.clone());
    let read_status_repo = ReadStatusRepositoryPg::default();

    // Connection Hub: một actor sở hữu toàn bộ registry fan-out,
    // inject vào Event Router và các service qua address
    let hub_addr = ConnectionHub::new(Arc::new(LogNotifier)).start();
    let hub = Arc::new(hub_addr.clone());

    let user_service =
        UserService::with_dependencies(Arc::new(user_repo.clone()), Arc::new(redis_pool));
    let room_service = RoomService::with_dependencies(
        Arc::new(room_repo.clone()),
        Arc::new(user_repo.clone()),
    );
    let group_service = GroupService::with_dependencies(
        Arc::new(group_repo),
        Arc::new(membership_repo.clone()),
        Arc::new(invitation_repo),
        Arc::new(user_repo),
        hub.clone(),
    );
    let message_service = MessageService::with_dependencies(
        Arc::new(private_message_repo),
        Arc::new(group_message_repo),
        Arc::new(read_status_repo),
        Arc::new(room_repo),
        Arc::new(membership_repo),
        hub.clone(),
    );

    let event_router = EventRouter::new(
        room_service.clone(),
        group_service.clone(),
        message_service.clone(),
        user_service.clone(),
        hub,
    );

    let upload_config = UploadConfig::default();
    let blob_storage: Arc<dyn BlobStorage> = Arc::new(DiskBlobStorage::new(upload_config.clone()));

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(room_service.clone()))
            .app_data(web::Data::new(group_service.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(event_router.clone()))
            .app_data(web::Data::new(hub_addr.clone()))
            .app_data(web::Data::new(blob_storage.clone()))
            .app_data(web::Data::new(upload_config.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .service(health_check)
            .service(
                web::scope("/ws").service(handler::private_ws).service(handler::group_ws),
            )
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    // Route history đăng ký trước: full-path resource phải
                    // match trước các scope /chats và /groups
                    .configure(modules::message::route::configure)
                    .configure(modules::room::route::configure)
                    .configure(modules::group::route::configure)
                    .configure(modules::attachment::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
