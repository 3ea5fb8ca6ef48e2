use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type the server uses for a successful authentication.
pub const AUTHENTICATION_SUCCESS: &str = "AUTHENTICATION_SUCCESS";

/// One entry of a user's audit feed (`GET api/audits/{login}`).
///
/// The feed is ordered newest-first; the first element is always the login
/// attempt currently in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: AuditEventData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEventData {
    #[serde(rename = "remoteAddress")]
    pub remote_address: Option<String>,
}

impl AuditEvent {
    pub fn is_authentication_success(&self) -> bool {
        self.event_type == AUTHENTICATION_SUCCESS
    }
}

/// Summary of the user's previous successful login, shown as a
/// security-awareness hint on the login screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub remote_address: Option<String>,
    pub time: DateTime<Utc>,
    pub failed_attempts_since_last_success: usize,
}
