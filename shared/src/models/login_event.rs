//! Login audit record

use serde::{Deserialize, Serialize};

use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginOutcome {
    #[serde(rename = "Exitoso", alias = "Success")]
    Success,
    #[serde(rename = "Fallido", alias = "Failure")]
    Failure,
}

/// Append-only login history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub id: String,
    /// Display date
    pub date: String,
    /// Epoch millis (0 for entries written before this field existed)
    #[serde(default)]
    pub timestamp: i64,
    pub user: String,
    pub status: LoginOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl LoginEvent {
    pub fn new(user: impl Into<String>, status: LoginOutcome, device: Option<String>) -> Self {
        let now = chrono::Local::now();
        Self {
            id: util::new_id(),
            date: util::display_date(now),
            timestamp: now.timestamp_millis(),
            user: user.into(),
            status,
            device,
        }
    }
}
