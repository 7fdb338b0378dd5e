/// Giới hạn cứng của group chat. Các giá trị này là hằng sản phẩm,
/// không đọc từ môi trường.
pub const GROUP_MAX_MEMBERS: i32 = 250;
pub const MAX_ACTIVE_GROUPS_PER_OWNER: i64 = 10;
pub const INVITATION_TTL_HOURS: i64 = 72;

pub const DEFAULT_PAGE_SIZE: i32 = 50;
pub const MAX_PAGE_SIZE: i32 = 200;

/// Thời gian cache profile user trong Redis (giây).
pub const PROFILE_CACHE_TTL_SECS: usize = 300;

pub struct Env {
    pub jwt_secret: String,
    pub database_url: String,
    pub redis_url: String,
    pub upload_dir: String,
    pub upload_base_url: String,
    pub ip: String,
    pub port: u16,
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let redis_url = std::env::var("REDIS_URL")
            .expect("REDIS_URL must be set in .env file or environment variable");

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let upload_base_url = std::env::var("UPLOAD_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/files".to_string());

        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16 integer");

        Env { jwt_secret, database_url, redis_url, upload_dir, upload_base_url, ip, port }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
