use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Outstanding or consumed code for one email address.
#[derive(Debug, Clone, FromRow)]
pub struct EmailVerification {
    pub email: String,
    pub otp: String,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

/// Result of the conditional user insert.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(User),
    NotVerified,
    EmailTaken,
}
