use actix_web::{web, FromRequest};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error;

/// Claims của access token do identity service bên ngoài phát hành.
/// Backend này chỉ verify, không bao giờ cấp token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn new(sub: &uuid::Uuid, exp: u64) -> Self {
        let now = chrono::Utc::now().timestamp() as u64;
        Claims { sub: *sub, iat: now, exp: now + exp }
    }

    /// Chỉ dùng trong test: tự ký token để giả lập identity service.
    pub fn encode(&self, secret: &[u8]) -> Result<String, error::SystemError> {
        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, self, &EncodingKey::from_secret(secret))?;
        Ok(token)
    }

    pub fn decode(token: &str, secret: &[u8]) -> Result<Self, error::SystemError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(token_data.claims)
    }
}

pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest for ValidatedJson<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Json::<T>::from_request(req, payload);

        Box::pin(async move {
            let json = fut.await.map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            let model = json.into_inner();
            model.validate().map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            Ok(ValidatedJson(model))
        })
    }
}

pub struct ValidatedQuery<T>(pub T);

impl<T> FromRequest for ValidatedQuery<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Query::<T>::from_request(req, payload);

        Box::pin(async move {
            let query = fut.await.map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            let query = query.into_inner();
            query.validate().map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            Ok(ValidatedQuery(query))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip() {
        let user_id = uuid::Uuid::now_v7();
        let secret = b"test-secret";

        let token = Claims::new(&user_id, 900).encode(secret).unwrap();
        let decoded = Claims::decode(&token, secret).unwrap();

        assert_eq!(decoded.sub, user_id);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let user_id = uuid::Uuid::now_v7();
        let secret = b"test-secret";

        let now = chrono::Utc::now().timestamp() as u64;
        // exp nằm ngoài cả leeway mặc định (60s)
        let claims = Claims { sub: user_id, iat: now - 1000, exp: now - 500 };
        let token = claims.encode(secret).unwrap();

        assert!(Claims::decode(&token, secret).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let user_id = uuid::Uuid::now_v7();

        let token = Claims::new(&user_id, 900).encode(b"secret-a").unwrap();
        assert!(Claims::decode(&token, b"secret-b").is_err());
    }
}
