use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_types::{RegisterOutcome, User};

/// Users and their email verification rows. Every method is a single statement so
/// that multi-step flows cannot interleave.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;

    /// Insert or replace the code for `email`, resetting `is_verified`.
    async fn upsert_code(&self, email: &str, otp: &str, now: OffsetDateTime) -> anyhow::Result<()>;

    /// Mark the row verified if the code matches and was issued after `cutoff`.
    async fn mark_verified(
        &self,
        email: &str,
        otp: &str,
        cutoff: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    /// Insert the user only if a verified row issued after `cutoff` exists, consuming it.
    async fn register_verified(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        cutoff: OffsetDateTime,
    ) -> anyhow::Result<RegisterOutcome>;

    /// Consume a matching fresh code and overwrite the user's hash. Returns the user id.
    async fn reset_password_with_code(
        &self,
        email: &str,
        otp: &str,
        cutoff: OffsetDateTime,
        password_hash: &str,
    ) -> anyhow::Result<Option<i64>>;
}

pub struct PgAuthStore {
    db: PgPool,
}

impl PgAuthStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn upsert_code(&self, email: &str, otp: &str, now: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO email_verifications (email, otp, is_verified, created_at)
            VALUES ($1, $2, FALSE, $3)
            ON CONFLICT (email) DO UPDATE
               SET otp = EXCLUDED.otp,
                   is_verified = FALSE,
                   created_at = EXCLUDED.created_at
            "#,
        )
        .bind(email)
        .bind(otp)
        .bind(now)
        .execute(&self.db)
        .await
        .context("upsert verification code")?;
        Ok(())
    }

    async fn mark_verified(
        &self,
        email: &str,
        otp: &str,
        cutoff: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE email_verifications
               SET is_verified = TRUE
             WHERE email = $1 AND otp = $2 AND created_at > $3
            "#,
        )
        .bind(email)
        .bind(otp)
        .bind(cutoff)
        .execute(&self.db)
        .await
        .context("mark verification row verified")?;
        Ok(res.rows_affected() == 1)
    }

    async fn register_verified(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        cutoff: OffsetDateTime,
    ) -> anyhow::Result<RegisterOutcome> {
        let created = sqlx::query_as::<_, User>(
            r#"
            WITH verified AS (
                SELECT email
                  FROM email_verifications
                 WHERE email = $2 AND is_verified = TRUE AND created_at > $4
                   FOR UPDATE
            ),
            inserted AS (
                INSERT INTO users (name, email, password_hash)
                SELECT $1, email, $3 FROM verified
                ON CONFLICT (email) DO NOTHING
                RETURNING id, name, email, password_hash, created_at
            ),
            consumed AS (
                DELETE FROM email_verifications
                 WHERE email IN (SELECT email FROM inserted)
            )
            SELECT id, name, email, password_hash, created_at FROM inserted
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(cutoff)
        .fetch_optional(&self.db)
        .await
        .context("conditional user insert")?;

        if let Some(user) = created {
            return Ok(RegisterOutcome::Created(user));
        }
        // Nothing inserted: either the row was missing/stale or another request won the race.
        if self.find_user_by_email(email).await?.is_some() {
            Ok(RegisterOutcome::EmailTaken)
        } else {
            Ok(RegisterOutcome::NotVerified)
        }
    }

    async fn reset_password_with_code(
        &self,
        email: &str,
        otp: &str,
        cutoff: OffsetDateTime,
        password_hash: &str,
    ) -> anyhow::Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            WITH consumed AS (
                DELETE FROM email_verifications
                 WHERE email = $1 AND otp = $2 AND created_at > $3
                   AND EXISTS (SELECT 1 FROM users WHERE email = $1)
                RETURNING email
            )
            UPDATE users
               SET password_hash = $4
              FROM consumed
             WHERE users.email = consumed.email
            RETURNING users.id
            "#,
        )
        .bind(email)
        .bind(otp)
        .bind(cutoff)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .context("conditional password reset")?;
        Ok(id)
    }
}

#[cfg(test)]
pub use memory::MemoryAuthStore;
