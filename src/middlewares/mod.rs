use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpMessage, HttpRequest,
};

use crate::{api::error, utils::Claims, ENV};

/// Xác thực Bearer token và gắn `Claims` vào request extensions.
/// Token do identity service bên ngoài phát hành; ở đây chỉ verify chữ ký.
pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let token = match auth.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t,
        None => {
            return Err(error::Error::unauthenticated("Missing bearer token").into());
        }
    };

    let claims = Claims::decode(token, ENV.jwt_secret.as_ref())
        .map_err(|_| error::Error::unauthenticated("Token invalid or expired"))?;

    req.extensions_mut().insert(claims);

    next.call(req).await
}

pub fn get_extensions<T: Clone + 'static>(req: &HttpRequest) -> Result<T, error::Error> {
    let extensions = req.extensions();

    let value = extensions
        .get::<T>()
        .ok_or_else(|| error::Error::unauthenticated("Unauthenticated"))?
        .clone();

    Ok(value)
}
