use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{HrLoginResponse, LoginRequest},
        jwt::JwtKeys,
        services::{normalize_email, MSG_INVALID_CREDENTIALS},
    },
    error::{AppError, Result},
    extract::ApiJson,
    state::AppState,
};

pub fn hr_routes() -> Router<AppState> {
    Router::new().route("/api/hr/login", post(hr_login))
}

/// Dashboard login against the single configured HR credential.
#[instrument(skip(state, payload))]
pub async fn hr_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<HrLoginResponse>> {
    let hr = &state.config.hr;
    let email = normalize_email(&payload.email);
    if email != normalize_email(&hr.email) || payload.password != hr.password {
        warn!(email = %email, "hr login rejected");
        return Err(AppError::unauthorized(MSG_INVALID_CREDENTIALS));
    }

    let token = JwtKeys::from_ref(&state)
        .sign_hr()
        .map_err(AppError::internal("Login failed! Please try again."))?;
    info!(email = %email, "hr logged in");
    Ok(Json(HrLoginResponse {
        message: "HR login successful".into(),
        token,
    }))
}

#[cfg(test)]
mod tests {
    use crate::state::testing::{body_json, TestContext};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn configured_credential_gets_an_hr_token() {
        let ctx = TestContext::new();
        let res = ctx
            .post_json(
                "/api/hr/login",
                json!({ "email": "HR@rft.com", "password": "password123" }),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let token = body_json(res).await["token"].as_str().unwrap().to_string();

        let jobs = ctx.get("/api/candidates", Some(&token)).await;
        assert_eq!(jobs.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let ctx = TestContext::new();
        let res = ctx
            .post_json(
                "/api/hr/login",
                json!({ "email": "hr@rft.com", "password": "nope" }),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
