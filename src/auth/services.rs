use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{info, instrument, warn};

use super::{
    jwt::JwtKeys,
    otp,
    password::{hash_password, is_strong_enough, verify_password, MIN_PASSWORD_LEN},
    repo_types::{RegisterOutcome, User},
};
use crate::{
    error::{AppError, Result},
    mailer::{self, OutgoingMail},
    state::AppState,
};

pub const MSG_ALREADY_REGISTERED: &str =
    "Email already registered! Please try logging in instead.";
pub const MSG_INVALID_CODE: &str =
    "Invalid or expired verification code! Please request a new one.";
pub const MSG_INVALID_RESET_CODE: &str = "Invalid or expired reset code! Please request a new one.";
pub const MSG_NOT_VERIFIED: &str = "Email not verified! Please verify your email first.";
pub const MSG_INVALID_CREDENTIALS: &str =
    "Invalid email or password! Please check your credentials and try again.";
pub const MSG_UNKNOWN_EMAIL: &str =
    "Email not found! Please check your email address and try again.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn checked_email(raw: &str) -> Result<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

fn otp_ttl(st: &AppState) -> Duration {
    Duration::minutes(st.config.otp.ttl_minutes)
}

async fn deliver(st: &AppState, mail: OutgoingMail, failure: &'static str) -> Result<()> {
    st.mailer.send(mail).await.map_err(AppError::internal(failure))
}

/// Issue a fresh code for `email`, replacing any outstanding one, and mail it.
async fn issue_code(st: &AppState, email: &str) -> Result<String> {
    let code = otp::generate();
    st.auth
        .upsert_code(email, &code, st.clock.now())
        .await
        .map_err(AppError::internal("Failed to send verification code! Please try again."))?;
    Ok(code)
}

#[instrument(skip(st))]
pub async fn send_otp(st: &AppState, email: &str) -> Result<()> {
    let email = checked_email(email)?;

    let existing = st
        .auth
        .find_user_by_email(&email)
        .await
        .map_err(AppError::internal("Failed to send verification code! Please try again."))?;
    if existing.is_some() {
        warn!(email = %email, "send-otp for registered email");
        return Err(AppError::validation(MSG_ALREADY_REGISTERED));
    }

    let code = issue_code(st, &email).await?;
    deliver(
        st,
        mailer::verification_mail(&email, &code, st.config.otp.ttl_minutes),
        "Failed to send verification code! Please try again.",
    )
    .await?;

    info!(email = %email, "verification code sent");
    Ok(())
}

#[instrument(skip(st, code))]
pub async fn verify_otp(st: &AppState, email: &str, code: &str) -> Result<()> {
    let email = normalize_email(email);
    let code = code.trim();
    if !otp::is_well_formed(code) {
        warn!(email = %email, "malformed verification code");
        return Err(AppError::validation(MSG_INVALID_CODE));
    }

    let cutoff = otp::cutoff(st.clock.now(), otp_ttl(st));
    let verified = st
        .auth
        .mark_verified(&email, code, cutoff)
        .await
        .map_err(AppError::internal("Failed to verify code! Please try again."))?;
    if !verified {
        warn!(email = %email, "invalid or expired verification code");
        return Err(AppError::validation(MSG_INVALID_CODE));
    }

    info!(email = %email, "email verified");
    Ok(())
}

#[instrument(skip(st, password))]
pub async fn register(st: &AppState, name: &str, email: &str, password: &str) -> Result<User> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let email = checked_email(email)?;
    if !is_strong_enough(password) {
        warn!("password too short");
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let existing = st
        .auth
        .find_user_by_email(&email)
        .await
        .map_err(AppError::internal("Registration failed! Please try again."))?;
    if existing.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::validation(MSG_ALREADY_REGISTERED));
    }

    let hash = hash_password(password)
        .map_err(AppError::internal("Registration failed! Please try again."))?;
    let cutoff = otp::cutoff(
        st.clock.now(),
        Duration::minutes(st.config.otp.verified_ttl_minutes),
    );

    let outcome = st
        .auth
        .register_verified(name, &email, &hash, cutoff)
        .await
        .map_err(AppError::internal("Registration failed! Please try again."))?;

    let user = match outcome {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::NotVerified => {
            warn!(email = %email, "register without verified email");
            return Err(AppError::validation(MSG_NOT_VERIFIED));
        }
        RegisterOutcome::EmailTaken => {
            warn!(email = %email, "lost registration race");
            return Err(AppError::validation(MSG_ALREADY_REGISTERED));
        }
    };

    deliver(
        st,
        mailer::welcome_mail(&user.email, &user.name, &st.config.public_site_url),
        "Registration failed! Please try again.",
    )
    .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

#[instrument(skip(st, password))]
pub async fn login(st: &AppState, email: &str, password: &str) -> Result<(String, User)> {
    let email = normalize_email(email);

    let user = st
        .auth
        .find_user_by_email(&email)
        .await
        .map_err(AppError::internal("Login failed! Please try again."))?;
    let Some(user) = user else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::unauthorized(MSG_INVALID_CREDENTIALS));
    };

    let ok = verify_password(password, &user.password_hash)
        .map_err(AppError::internal("Login failed! Please try again."))?;
    if !ok {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(AppError::unauthorized(MSG_INVALID_CREDENTIALS));
    }

    let token = JwtKeys::from_ref(st)
        .sign_user(user.id)
        .map_err(AppError::internal("Login failed! Please try again."))?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((token, user))
}

#[instrument(skip(st))]
pub async fn forgot_password(st: &AppState, email: &str) -> Result<()> {
    let email = normalize_email(email);

    let user = st
        .auth
        .find_user_by_email(&email)
        .await
        .map_err(AppError::internal("Something went wrong! Please try again in a few moments."))?;
    if user.is_none() {
        warn!(email = %email, "forgot-password for unknown email");
        return Err(AppError::not_found(MSG_UNKNOWN_EMAIL));
    }

    let code = issue_code(st, &email).await?;
    deliver(
        st,
        mailer::reset_code_mail(&email, &code, st.config.otp.ttl_minutes),
        "Something went wrong! Please try again in a few moments.",
    )
    .await?;

    info!(email = %email, "password reset code sent");
    Ok(())
}

#[instrument(skip(st, code, new_password))]
pub async fn reset_password(
    st: &AppState,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<()> {
    let email = normalize_email(email);
    let code = code.trim();
    if !otp::is_well_formed(code) {
        return Err(AppError::validation(MSG_INVALID_RESET_CODE));
    }
    if !is_strong_enough(new_password) {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let hash = hash_password(new_password)
        .map_err(AppError::internal("Failed to reset password! Please try again."))?;
    let cutoff = otp::cutoff(st.clock.now(), otp_ttl(st));
    let reset = st
        .auth
        .reset_password_with_code(&email, code, cutoff, &hash)
        .await
        .map_err(AppError::internal("Failed to reset password! Please try again."))?;

    let Some(user_id) = reset else {
        warn!(email = %email, "invalid or expired reset code");
        return Err(AppError::validation(MSG_INVALID_RESET_CODE));
    };

    deliver(
        st,
        mailer::password_changed_mail(&email, &st.config.public_site_url),
        "Failed to reset password! Please try again.",
    )
    .await?;

    info!(user_id, email = %email, "password reset");
    Ok(())
}

pub async fn current_user(st: &AppState, user_id: i64) -> Result<User> {
    st.auth
        .find_user_by_id(user_id)
        .await
        .map_err(AppError::internal("Something went wrong! Please try again."))?
        .ok_or_else(|| {
            warn!(user_id, "token for missing user");
            AppError::unauthorized("User not found")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::TestContext;
    use axum::http::StatusCode;

    const EMAIL: &str = "a@x.com";

    async fn verified(ctx: &TestContext, email: &str) {
        send_otp(&ctx.state, email).await.unwrap();
        let code = ctx.mailer.last_code_for(email).unwrap();
        verify_otp(&ctx.state, email, &code).await.unwrap();
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[tokio::test]
    async fn second_send_otp_invalidates_first_code() {
        let ctx = TestContext::new();
        send_otp(&ctx.state, EMAIL).await.unwrap();
        let first = ctx.mailer.last_code_for(EMAIL).unwrap();
        let mut second = first.clone();
        while second == first {
            send_otp(&ctx.state, EMAIL).await.unwrap();
            second = ctx.mailer.last_code_for(EMAIL).unwrap();
        }

        let err = verify_otp(&ctx.state, EMAIL, &first).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        verify_otp(&ctx.state, EMAIL, &second).await.unwrap();
    }

    #[tokio::test]
    async fn send_otp_rejects_registered_email() {
        let ctx = TestContext::new();
        ctx.store.insert_user("Ann", EMAIL, "hash");
        let err = send_otp(&ctx.state, EMAIL).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), MSG_ALREADY_REGISTERED);
        assert!(ctx.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn send_otp_mail_failure_is_internal_error() {
        let ctx = TestContext::new();
        ctx.mailer.set_failing(true);
        let err = send_otp(&ctx.state, EMAIL).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn verify_otp_honours_ten_minute_window() {
        let ctx = TestContext::new();
        send_otp(&ctx.state, EMAIL).await.unwrap();
        let code = ctx.mailer.last_code_for(EMAIL).unwrap();

        ctx.clock.advance(Duration::minutes(9) + Duration::seconds(59));
        verify_otp(&ctx.state, EMAIL, &code).await.unwrap();

        ctx.clock.advance(Duration::seconds(2));
        let err = verify_otp(&ctx.state, EMAIL, &code).await.unwrap_err();
        assert_eq!(err.to_string(), MSG_INVALID_CODE);
    }

    #[tokio::test]
    async fn code_ten_minutes_and_one_second_old_fails() {
        let ctx = TestContext::new();
        send_otp(&ctx.state, EMAIL).await.unwrap();
        let code = ctx.mailer.last_code_for(EMAIL).unwrap();
        ctx.clock.advance(Duration::minutes(10) + Duration::seconds(1));
        assert!(verify_otp(&ctx.state, EMAIL, &code).await.is_err());
        assert!(!ctx.store.verification(EMAIL).unwrap().is_verified);
    }

    #[tokio::test]
    async fn register_requires_verified_row() {
        let ctx = TestContext::new();
        let err = register(&ctx.state, "Ann", EMAIL, "password123").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_NOT_VERIFIED);

        send_otp(&ctx.state, EMAIL).await.unwrap();
        let err = register(&ctx.state, "Ann", EMAIL, "password123").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ctx.store.user_count(), 0);
    }

    #[tokio::test]
    async fn register_rejects_existing_user_even_when_verified() {
        let ctx = TestContext::new();
        verified(&ctx, EMAIL).await;
        ctx.store.insert_user("Other", EMAIL, "hash");
        let err = register(&ctx.state, "Ann", EMAIL, "password123").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_ALREADY_REGISTERED);
        // the verification row is left alone
        assert!(ctx.store.verification(EMAIL).is_some());
    }

    #[tokio::test]
    async fn register_consumes_verification_and_sends_welcome() {
        let ctx = TestContext::new();
        verified(&ctx, EMAIL).await;
        let user = register(&ctx.state, " Ann ", "A@X.com", "password123").await.unwrap();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, EMAIL);
        assert!(ctx.store.verification(EMAIL).is_none());
        let last = ctx.mailer.sent().pop().unwrap();
        assert!(last.subject.contains("Welcome"));
    }

    #[tokio::test]
    async fn register_rejects_stale_verification() {
        let ctx = TestContext::new();
        verified(&ctx, EMAIL).await;
        ctx.clock.advance(Duration::minutes(61));
        let err = register(&ctx.state, "Ann", EMAIL, "password123").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_NOT_VERIFIED);
    }

    #[tokio::test]
    async fn register_fails_when_welcome_mail_fails() {
        let ctx = TestContext::new();
        verified(&ctx, EMAIL).await;
        ctx.mailer.set_failing(true);
        let err = register(&ctx.state, "Ann", EMAIL, "password123").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Registration failed!"));
    }

    #[tokio::test]
    async fn reset_fails_when_confirmation_mail_fails() {
        let ctx = TestContext::new();
        ctx.store
            .insert_user("Ann", EMAIL, &hash_password("password123").unwrap());
        forgot_password(&ctx.state, EMAIL).await.unwrap();
        let code = ctx.mailer.last_code_for(EMAIL).unwrap();
        ctx.mailer.set_failing(true);
        let err = reset_password(&ctx.state, EMAIL, &code, "brandnewpass")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let ctx = TestContext::new();
        assert!(register(&ctx.state, "", EMAIL, "password123").await.is_err());
        assert!(register(&ctx.state, "Ann", "nope", "password123").await.is_err());
        assert!(register(&ctx.state, "Ann", EMAIL, "short").await.is_err());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let ctx = TestContext::new();
        ctx.store
            .insert_user("Ann", EMAIL, &hash_password("password123").unwrap());

        let wrong_pw = login(&ctx.state, EMAIL, "password124").await.unwrap_err();
        let unknown = login(&ctx.state, "b@x.com", "password123").await.unwrap_err();
        assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_issues_day_long_token_for_user() {
        let ctx = TestContext::new();
        let user = ctx
            .store
            .insert_user("Ann", EMAIL, &hash_password("password123").unwrap());
        let (token, logged_in) = login(&ctx.state, EMAIL, "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        let claims = JwtKeys::from_ref(&ctx.state).verify(&token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[tokio::test]
    async fn forgot_password_unknown_email_is_not_found() {
        let ctx = TestContext::new();
        let err = forgot_password(&ctx.state, EMAIL).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reset_password_consumes_code() {
        let ctx = TestContext::new();
        ctx.store.insert_user("Ann", EMAIL, &hash_password("oldpassword").unwrap());
        forgot_password(&ctx.state, EMAIL).await.unwrap();
        let code = ctx.mailer.last_code_for(EMAIL).unwrap();

        reset_password(&ctx.state, EMAIL, &code, "newpassword").await.unwrap();
        assert!(ctx.store.verification(EMAIL).is_none());
        assert!(login(&ctx.state, EMAIL, "newpassword").await.is_ok());
        assert!(login(&ctx.state, EMAIL, "oldpassword").await.is_err());

        let err = reset_password(&ctx.state, EMAIL, &code, "anotherpass").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_INVALID_RESET_CODE);
    }

    #[tokio::test]
    async fn reset_password_rejects_expired_code() {
        let ctx = TestContext::new();
        ctx.store.insert_user("Ann", EMAIL, &hash_password("oldpassword").unwrap());
        forgot_password(&ctx.state, EMAIL).await.unwrap();
        let code = ctx.mailer.last_code_for(EMAIL).unwrap();
        ctx.clock.advance(Duration::minutes(10));
        assert!(reset_password(&ctx.state, EMAIL, &code, "newpassword").await.is_err());
        assert!(login(&ctx.state, EMAIL, "oldpassword").await.is_ok());
    }

    #[tokio::test]
    async fn full_registration_walkthrough() {
        let ctx = TestContext::new();
        send_otp(&ctx.state, EMAIL).await.unwrap();
        let code = ctx.mailer.last_code_for(EMAIL).unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        assert!(verify_otp(&ctx.state, EMAIL, wrong).await.is_err());
        verify_otp(&ctx.state, EMAIL, &code).await.unwrap();
        let user = register(&ctx.state, "Ann", EMAIL, "password123").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(current_user(&ctx.state, user.id).await.unwrap().email, EMAIL);
    }
}
