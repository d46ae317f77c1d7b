use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, Role};
use crate::{config::JwtConfig, error::AppError};

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_role(&self, id: i64, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(id, role = ?role, "jwt signed");
        Ok(token)
    }

    pub fn sign_user(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign_with_role(user_id, Role::User)
    }

    pub fn sign_hr(&self) -> anyhow::Result<String> {
        self.sign_with_role(0, Role::Hr)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(id = data.claims.id, role = ?data.claims.role, "jwt verified");
        Ok(data.claims)
    }
}

fn bearer_claims(parts: &Parts, keys: &JwtKeys) -> Result<Claims, AppError> {
    let token = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;

    keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::forbidden("Invalid or expired token")
    })
}

/// Authenticated candidate account; carries the user id from the token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = bearer_claims(parts, &keys)?;
        if claims.role != Role::User {
            return Err(AppError::forbidden("User account required"));
        }
        Ok(AuthUser(claims.id))
    }
}

/// Authenticated HR dashboard session.
#[derive(Debug, Clone, Copy)]
pub struct HrUser;

#[async_trait]
impl<S> FromRequestParts<S> for HrUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = bearer_claims(parts, &keys)?;
        if claims.role != Role::Hr {
            warn!(id = claims.id, "non-HR token on HR route");
            return Err(AppError::forbidden("HR access required"));
        }
        Ok(HrUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            ttl_minutes: 60 * 24,
        })
    }

    #[test]
    fn sign_and_verify_user_token() {
        let keys = make_keys("dev-secret");
        let token = keys.sign_user(42).expect("sign user");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn hr_token_carries_hr_role() {
        let keys = make_keys("dev-secret");
        let claims = keys.verify(&keys.sign_hr().unwrap()).unwrap();
        assert_eq!(claims.role, Role::Hr);
    }

    #[test]
    fn verify_rejects_token_signed_with_other_secret() {
        let good = make_keys("secret-a");
        let bad = make_keys("secret-b");
        let token = good.sign_user(1).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            id: 7,
            role: Role::User,
            iat: now - 3 * 86_400,
            exp: now - 2 * 86_400,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_without_role_is_a_user_token() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let payload = serde_json::json!({ "id": 9, "iat": now, "exp": now + 60 });
        let token = encode(&Header::default(), &payload, &keys.encoding).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.id, 9);
        assert_eq!(claims.role, Role::User);
    }
}
