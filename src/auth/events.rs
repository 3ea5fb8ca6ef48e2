use serde::{Deserialize, Serialize};

/// Why a session ended. Controls whether a best-effort server notification
/// is attempted on logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogoutReason {
    PasswordReset,
    Unauthorized,
    LogoutButton,
    SessionTimeout,
}

impl LogoutReason {
    /// Whether the server should be told about this logout. An
    /// `Unauthorized` logout means the server already rejected us, so there
    /// is nothing to acknowledge.
    pub fn notifies_server(&self) -> bool {
        !matches!(self, LogoutReason::Unauthorized)
    }
}

/// The closed set of session lifecycle events.
///
/// Broadcast by the `SessionController` over a `tokio::sync::broadcast`
/// channel. The last-session cache invalidates on every variant; other
/// dependents (navigation, status display) pick what they need.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    AuthenticationSuccess { login: String },
    AuthenticationFailure,
    Logout { reason: LogoutReason },
}
