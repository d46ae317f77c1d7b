use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{AuthStore, PgAuthStore},
    },
    candidates::repo::{CandidateStore, PgCandidateStore},
    clock::{Clock, SystemClock},
    config::AppConfig,
    db,
    jobs::repo::{JobStore, PgJobStore},
    mailer::{self, Mailer},
    storage::{Storage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthStore>,
    pub jobs: Arc<dyn JobStore>,
    pub candidates: Arc<dyn CandidateStore>,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn StorageClient>,
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        let storage = Arc::new(Storage::from_config(&config).await?) as Arc<dyn StorageClient>;
        let mailer: Arc<dyn Mailer> = Arc::from(mailer::create_mailer(config.smtp.as_ref()));

        Ok(Self {
            auth: Arc::new(PgAuthStore::new(db.clone())),
            jobs: Arc::new(PgJobStore::new(db.clone())),
            candidates: Arc::new(PgCandidateStore::new(db)),
            mailer,
            storage,
            clock: Arc::new(SystemClock),
            config,
        })
    }
}
