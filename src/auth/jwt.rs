use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, warn};

use super::{cookies::TOKEN_COOKIE, errors::TokenError, repo_types::SafeUser};
use crate::{config::JwtConfig, error::AppError};

/// Fixed lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::days(1);

/// JWT payload: the safe user projection plus timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: TOKEN_TTL,
        }
    }

    pub fn sign(&self, user: &SafeUser) -> Result<String, TokenError> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    fn sign_at(&self, user: &SafeUser, now: OffsetDateTime) -> Result<String, TokenError> {
        let exp = now + self.ttl;
        let claims = Claims {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "failed to sign jwt");
            TokenError::Sign(e)
        })?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            warn!(error = %e, "failed to verify jwt");
            TokenError::Invalid(e)
        })?;
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

/// Verified claims of the caller, taken from the `token` cookie or a bearer header.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let from_cookie = CookieJar::from_headers(&parts.headers)
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string());
        let token = from_cookie
            .or_else(|| {
                parts
                    .headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .map(str::to_string)
            })
            .ok_or(AppError::Unauthenticated)?;

        let claims = keys.verify(&token).map_err(|_| AppError::Unauthenticated)?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
        })
    }

    fn user() -> SafeUser {
        SafeUser {
            id: 7,
            name: "A".into(),
            email: "a@x.com".into(),
            role: "user".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(&user()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.name, "A");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn token_lives_for_one_day() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - Duration::days(1) - Duration::minutes(5);
        let token = keys.sign_at(&user(), issued).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("secret-one").sign(&user()).unwrap();
        let err = make_keys("secret-two").verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let err = make_keys("dev-secret").verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }
}
