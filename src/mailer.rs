use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Logs mails instead of delivering them. Used when SMTP is not configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "[mock email] not delivered");
        tracing::debug!(html = %mail.html, "[mock email] body");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(cfg.username.clone(), cfg.password.clone());

        let transport = match cfg.encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
                .map_err(|e| MailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(cfg.port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
                .map_err(|e| MailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                .port(cfg.port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
                .port(cfg.port)
                .credentials(credentials)
                .build(),
            other => {
                return Err(MailError::ConfigError(format!(
                    "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
                    other
                )))
            }
        };

        Ok(Self {
            transport,
            from: format!("{} <{}>", cfg.from_name, cfg.from_email),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| MailError::MessageBuild(format!("Invalid from address: {}", e)))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| MailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)
            .map_err(|e| MailError::MessageBuild(e.to_string()))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::SendFailed(e.to_string()))?;
        tracing::debug!(to = %mail.to, code = %response.code(), "email sent");
        Ok(())
    }
}

pub fn create_mailer(smtp: Option<&SmtpConfig>) -> Box<dyn Mailer> {
    match smtp {
        Some(cfg) => match SmtpMailer::new(cfg) {
            Ok(mailer) => {
                tracing::info!(host = %cfg.host, "using SMTP mailer");
                Box::new(mailer)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to initialize SMTP mailer, falling back to log mailer");
                Box::new(LogMailer)
            }
        },
        None => {
            tracing::info!("SMTP not configured, mails will only be logged");
            Box::new(LogMailer)
        }
    }
}

// ---- templates ----

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 30px; background-color: #f9f9f9;">
    <h1 style="color: #2e7d32; font-size: 26px; text-align: center;">{title}</h1>
{body}
</body>
</html>
"#
    )
}

fn code_block(code: &str, caption: &str) -> String {
    format!(
        r#"    <div style="text-align: center; margin: 30px 0; padding: 20px; background-color: #e8f5e8; border-radius: 8px;">
        <h2 style="color: #2e7d32; font-size: 32px; margin: 0; letter-spacing: 8px; font-family: monospace;">{code}</h2>
        <p style="color: #666; margin: 10px 0 0 0; font-size: 14px;">{caption}</p>
    </div>"#
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"    <p style="text-align: center; margin: 30px 0;">
        <a href="{href}" style="background-color: #4CAF50; color: #fff; padding: 12px 25px; text-decoration: none; border-radius: 6px; font-weight: bold;">{label}</a>
    </p>"#
    )
}

pub fn verification_mail(to: &str, code: &str, ttl_minutes: i64) -> OutgoingMail {
    let body = format!(
        "    <p>Welcome to RFT Careers! Please verify your email address to complete your registration.</p>\n{}\n    <p style=\"font-size: 14px; color: #666;\"><strong>This code is valid for {} minutes.</strong> If you didn't sign up for RFT Careers, you can ignore this email.</p>",
        code_block(code, "Your 6-digit verification code"),
        ttl_minutes
    );
    OutgoingMail {
        to: to.into(),
        subject: "Verify Your Email - RFT Careers".into(),
        html: layout("Email Verification", &body),
    }
}

pub fn welcome_mail(to: &str, name: &str, site_url: &str) -> OutgoingMail {
    let body = format!(
        "    <p style=\"text-align: center;\">We're thrilled to have you onboard with <strong>RFT Careers</strong>. You can now explore job opportunities tailored for you.</p>\n{}",
        button(&format!("{}/dashboard", site_url), "Go to Your Dashboard")
    );
    OutgoingMail {
        to: to.into(),
        subject: "Welcome to RFT Careers!".into(),
        html: layout(&format!("Welcome, {}!", html_escape(name)), &body),
    }
}

pub fn reset_code_mail(to: &str, code: &str, ttl_minutes: i64) -> OutgoingMail {
    let body = format!(
        "    <p>We received a request to reset the password for your RFT Careers account.</p>\n{}\n    <p style=\"font-size: 14px; color: #666;\"><strong>This code is valid for {} minutes.</strong> If you didn't request a reset, you can ignore this email.</p>",
        code_block(code, "Your 6-digit reset code"),
        ttl_minutes
    );
    OutgoingMail {
        to: to.into(),
        subject: "Reset Your Password - RFT Careers".into(),
        html: layout("Password Reset Request", &body),
    }
}

pub fn password_changed_mail(to: &str, site_url: &str) -> OutgoingMail {
    let body = format!(
        "    <p>Your password has been updated. You can now log in with your new password.</p>\n{}\n    <p style=\"font-size: 14px; color: #155724;\"><strong>Security note:</strong> if you didn't make this change, contact our support team immediately.</p>",
        button(&format!("{}/signin", site_url), "Go to Login")
    );
    OutgoingMail {
        to: to.into(),
        subject: "Password Successfully Reset - RFT Careers".into(),
        html: layout("Password Reset Successful", &body),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
pub use recording::RecordingMailer;
