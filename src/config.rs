use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// How long an issued code can be verified or used for a reset.
    pub ttl_minutes: i64,
    /// How long a verified code stays usable for completing registration.
    pub verified_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HrConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub encryption: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub hr: HrConfig,
    pub smtp: Option<SmtpConfig>,
    pub public_site_url: String,
    pub minio_endpoint: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// Parses `key` when it is set; an unset key yields `default`, a malformed one is an error.
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl SmtpConfig {
    /// Returns `None` when `SMTP_HOST` is unset, in which case mails are only logged.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };
        Ok(Some(Self {
            host,
            port: env_parse("SMTP_PORT", 587)?,
            username: std::env::var("SMTP_USERNAME")
                .map_err(|_| anyhow::anyhow!("SMTP_USERNAME not set"))?,
            password: std::env::var("SMTP_PASSWORD")
                .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD not set"))?,
            from_email: std::env::var("SMTP_FROM_EMAIL")
                .map_err(|_| anyhow::anyhow!("SMTP_FROM_EMAIL not set"))?,
            from_name: env_or("SMTP_FROM_NAME", "RFT Careers"),
            encryption: env_or("SMTP_ENCRYPTION", "starttls"),
        }))
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60 * 24)?,
        };
        let otp = OtpConfig {
            ttl_minutes: env_parse("OTP_TTL_MINUTES", 10)?,
            verified_ttl_minutes: env_parse("VERIFIED_TTL_MINUTES", 60)?,
        };
        let hr = HrConfig {
            email: env_or("HR_EMAIL", "hr@rft.com"),
            password: env_or("HR_PASSWORD", "password123"),
        };
        Ok(Self {
            database_url,
            jwt,
            otp,
            hr,
            smtp: SmtpConfig::from_env()?,
            public_site_url: env_or("PUBLIC_SITE_URL", "https://rftcareers.com"),
            minio_endpoint: env_or("MINIO_ENDPOINT", "http://localhost:9000"),
            minio_bucket: env_or("MINIO_BUCKET", "rft-careers"),
            minio_access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            minio_secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
        })
    }
}
