use std::time::Duration;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use super::session::SessionError;
use crate::auth::dto::{LoginResponse, MessageResponse, PublicUser, RegisterResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("{action} is not possible at this step")]
    OutOfOrder { action: &'static str },

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin wrapper over the `/api/auth` endpoints.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Something went wrong")
                .to_string(),
        };
        tracing::debug!(%status, %message, "api error");
        Err(ClientError::Api { status, message })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    pub async fn send_otp(&self, email: &str) -> Result<MessageResponse, ClientError> {
        self.post("/send-otp", &json!({ "email": email })).await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<MessageResponse, ClientError> {
        self.post("/verify-otp", &json!({ "email": email, "otp": otp })).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        self.post(
            "/register",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        self.post("/login", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ClientError> {
        self.post("/forgot-password", &json!({ "email": email })).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.post(
            "/reset-password",
            &json!({ "email": email, "otp": otp, "newPassword": new_password }),
        )
        .await
    }

    pub async fn me(&self, token: &str) -> Result<PublicUser, ClientError> {
        let response = self
            .client
            .get(self.url("/me"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::decode(response).await
    }
}
