use super::{
    api::{ApiClient, ClientError},
    session::{Session, SessionStore},
};
use crate::auth::{dto::PublicUser, otp, password::MIN_PASSWORD_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStep {
    EnterEmail,
    AwaitingCode { email: String },
    Verified { email: String },
    Registered { user: PublicUser },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetStep {
    EnterEmail,
    AwaitingCode { email: String },
    Done,
}

fn check_code(code: &str) -> Result<&str, ClientError> {
    let code = code.trim();
    if !otp::is_well_formed(code) {
        return Err(ClientError::Validation(
            "Please enter the 6-digit code from your email".into(),
        ));
    }
    Ok(code)
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), ClientError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirm {
        return Err(ClientError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<String, ClientError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ClientError::Validation("Please enter a valid email address".into()));
    }
    Ok(email)
}

/// Sign-up wizard: email, emailed code, then name and password.
pub struct RegistrationFlow {
    api: ApiClient,
    step: RegistrationStep,
}

impl RegistrationFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            step: RegistrationStep::EnterEmail,
        }
    }

    pub fn step(&self) -> &RegistrationStep {
        &self.step
    }

    /// Sends a code to `email`. Allowed again while waiting, which replaces the code.
    pub async fn request_code(&mut self, email: &str) -> Result<String, ClientError> {
        if !matches!(
            self.step,
            RegistrationStep::EnterEmail | RegistrationStep::AwaitingCode { .. }
        ) {
            return Err(ClientError::OutOfOrder { action: "Requesting a code" });
        }
        let email = check_email(email)?;
        let res = self.api.send_otp(&email).await?;
        self.step = RegistrationStep::AwaitingCode { email };
        Ok(res.message)
    }

    pub async fn submit_code(&mut self, code: &str) -> Result<String, ClientError> {
        let RegistrationStep::AwaitingCode { email } = &self.step else {
            return Err(ClientError::OutOfOrder { action: "Verifying a code" });
        };
        let code = check_code(code)?;
        let res = self.api.verify_otp(email, code).await?;
        self.step = RegistrationStep::Verified {
            email: email.clone(),
        };
        Ok(res.message)
    }

    pub async fn complete(
        &mut self,
        name: &str,
        password: &str,
        confirm: &str,
    ) -> Result<PublicUser, ClientError> {
        let RegistrationStep::Verified { email } = &self.step else {
            return Err(ClientError::OutOfOrder { action: "Creating the account" });
        };
        if name.trim().is_empty() {
            return Err(ClientError::Validation("Please enter your name".into()));
        }
        check_new_password(password, confirm)?;
        let res = self.api.register(name.trim(), email, password).await?;
        self.step = RegistrationStep::Registered {
            user: res.user.clone(),
        };
        Ok(res.user)
    }
}

/// Forgot-password wizard: email, then emailed code with the new password.
pub struct ResetFlow {
    api: ApiClient,
    step: ResetStep,
}

impl ResetFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            step: ResetStep::EnterEmail,
        }
    }

    pub fn step(&self) -> &ResetStep {
        &self.step
    }

    pub async fn request_code(&mut self, email: &str) -> Result<String, ClientError> {
        if self.step == ResetStep::Done {
            return Err(ClientError::OutOfOrder { action: "Requesting a reset code" });
        }
        let email = check_email(email)?;
        let res = self.api.forgot_password(&email).await?;
        self.step = ResetStep::AwaitingCode { email };
        Ok(res.message)
    }

    pub async fn reset(
        &mut self,
        code: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<String, ClientError> {
        let ResetStep::AwaitingCode { email } = &self.step else {
            return Err(ClientError::OutOfOrder { action: "Resetting the password" });
        };
        let code = check_code(code)?;
        check_new_password(new_password, confirm)?;
        let res = self.api.reset_password(email, code, new_password).await?;
        self.step = ResetStep::Done;
        Ok(res.message)
    }
}

/// Logs in and persists the session.
pub async fn login(
    api: &ApiClient,
    store: &dyn SessionStore,
    email: &str,
    password: &str,
) -> Result<Session, ClientError> {
    let email = check_email(email)?;
    let res = api.login(&email, password).await?;
    let session = Session {
        token: res.token,
        user: res.user,
    };
    store.set(&session)?;
    tracing::info!(user_id = session.user.id, "session stored");
    Ok(session)
}

pub fn logout(store: &dyn SessionStore) -> Result<(), ClientError> {
    store.clear()?;
    Ok(())
}
