//! Login gate
//!
//! The shop runs a single staff account. Every attempt, good or bad, ends
//! up in the login history.

use shared::{LoginEvent, LoginOutcome};

use crate::config::SyncConfig;

#[derive(Clone)]
pub struct LoginGate {
    user: String,
    password: String,
    device: String,
}

impl std::fmt::Debug for LoginGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGate")
            .field("user", &self.user)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl LoginGate {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            device: device.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.admin_user.clone(),
            config.admin_password.clone(),
            config.device_name.clone(),
        )
    }

    /// Check the credentials and build the history entry for the attempt
    pub fn attempt(&self, user: &str, password: &str) -> LoginEvent {
        let status = if user == self.user && password == self.password {
            LoginOutcome::Success
        } else {
            LoginOutcome::Failure
        };
        tracing::info!(user = %user, ?status, "Login attempt");
        LoginEvent::new(user, status, Some(self.device.clone()))
    }
}
