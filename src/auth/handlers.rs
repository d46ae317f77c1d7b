use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use tracing::instrument;

use super::{
    dto::{
        EmailRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequest,
        RegisterResponse, ResetPasswordRequest, VerifyOtpRequest,
    },
    jwt::AuthUser,
    services,
};
use crate::{error::Result, extract::ApiJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/send-otp", post(send_otp))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    services::send_otp(&state, &payload.email).await?;
    Ok(Json(MessageResponse::new(
        "✅ Verification code sent to your email! Check your inbox (and spam folder).",
    )))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>> {
    services::verify_otp(&state, &payload.email, &payload.otp).await?;
    Ok(Json(MessageResponse::new(
        "✅ Email verified successfully! You can now complete your registration.",
    )))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let user = services::register(&state, &payload.name, &payload.email, &payload.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "🎉 Registration successful! Welcome to RFT Careers!".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (token, user) = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        message: "✅ Login successful! Welcome back!".into(),
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    services::forgot_password(&state, &payload.email).await?;
    Ok(Json(MessageResponse::new(
        "✅ Password reset code sent to your email! Check your inbox (and spam folder).",
    )))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    services::reset_password(&state, &payload.email, &payload.otp, &payload.new_password).await?;
    Ok(Json(MessageResponse::new(
        "🎉 Password reset successful! You can now log in with your new password.",
    )))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>> {
    let user = services::current_user(&state, user_id).await?;
    Ok(Json(user.into()))
}
