#![allow(unused)]
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use deadpool_redis::{redis::RedisError, PoolError};
use std::borrow::Cow;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(Cow<'static, str>),
    #[error("Not Authorized: {0}")]
    NotAuthorized(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Capacity Exceeded: {0}")]
    CapacityExceeded(Cow<'static, str>),
    #[error("Invalid Operation: {0}")]
    InvalidOperation(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn not_authorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotAuthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) | Error::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::NotAuthorized(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::CapacityExceeded(_) => StatusCode::CONFLICT,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());

        match self {
            Error::BadRequest(msg)
            | Error::Unauthenticated(msg)
            | Error::NotAuthorized(msg)
            | Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::CapacityExceeded(msg)
            | Error::InvalidOperation(msg) => res.json(ErrorBody { message: msg.clone() }),
            Error::InternalServer => res.json(ErrorBody { message: "Internal Server Error".into() }),
        }
    }
}

/// Lỗi tầng trong: giữ nguyên nguồn gốc (sqlx/redis/jwt/serde) để log,
/// sau đó thu gọn thành `Error` trước khi trả về client.
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    #[error("JWT Error")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    #[error("Database Error: {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("JSON Serialization/Deserialization Error")]
    JsonError(#[from] serde_json::Error),
    #[error("Redis pool error: {0}")]
    PoolGet(#[from] PoolError),
    #[error("Redis error")]
    RedisError(#[from] RedisError),
    #[error("IO Error")]
    IoError(#[from] std::io::Error),
    // Domain errors
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(Cow<'static, str>),
    #[error("Not Authorized: {0}")]
    NotAuthorized(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0:?}")]
    Conflict(Option<DbErrorMeta>),
    #[error("Capacity Exceeded: {0}")]
    CapacityExceeded(Cow<'static, str>),
    #[error("Invalid Operation: {0}")]
    InvalidOperation(Cow<'static, str>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug)]
pub struct DbErrorMeta {
    pub code: Option<String>,
    pub constraint: Option<String>,
    pub message: String,
}

fn conflict_message(meta: &Option<DbErrorMeta>) -> Cow<'static, str> {
    let Some(m) = meta else {
        return "Duplicate value".into();
    };

    match m.constraint.as_deref() {
        Some("private_rooms_pair_key") => "Conversation already exists".into(),
        Some("group_rooms_owner_name_key") => "You already have a group with this name".into(),
        Some("group_members_pkey") => "User is already a member of this group".into(),
        Some("group_invitations_target_key") => "User has already been invited to this group".into(),
        _ => "Duplicate value".into(),
    }
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::BadRequest(msg) => Error::BadRequest(msg),
            SystemError::Unauthenticated(msg) => Error::Unauthenticated(msg),
            SystemError::NotAuthorized(msg) => Error::NotAuthorized(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::Conflict(meta) => Error::Conflict(conflict_message(&meta)),
            SystemError::CapacityExceeded(msg) => Error::CapacityExceeded(msg),
            SystemError::InvalidOperation(msg) => Error::InvalidOperation(msg),
            _ => {
                log::error!("Internal Server Error: {:?}", value);
                Error::InternalServer
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        log::error!("{:?}", err);
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return SystemError::Conflict(Some(DbErrorMeta {
                        code: db_err.code().map(|s| s.to_string()),
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }));
                }
                Some("42P01") => {
                    return SystemError::NotFound("Resource not found".into());
                }
                _ => {
                    log::error!("Unhandled DB error: {:?}", db_err);
                    return SystemError::DatabaseError(db_err.message().to_string().into());
                }
            }
        }
        SystemError::InternalError(Box::new(err))
    }
}

impl SystemError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn not_authorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotAuthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn capacity_exceeded(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::CapacityExceeded(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_constraint_maps_to_friendly_message() {
        let meta = Some(DbErrorMeta {
            code: Some("23505".to_string()),
            constraint: Some("group_members_pkey".to_string()),
            message: "duplicate key value".to_string(),
        });
        let err: Error = SystemError::Conflict(meta).into();
        match err {
            Error::Conflict(msg) => assert_eq!(msg, "User is already a member of this group"),
            _ => panic!("Expected Conflict variant"),
        }
    }

    #[test]
    fn test_capacity_exceeded_status_code() {
        let err = Error::CapacityExceeded("This group is full".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_operation_status_code() {
        let err = Error::InvalidOperation("Admins cannot leave the group".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err: Error =
            SystemError::DatabaseError("connection refused at 10.0.0.3:5432".into()).into();
        assert!(matches!(err, Error::InternalServer));
    }
}
