use std::fmt;

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;
use thiserror::Error;

/// Response header carrying the one-time password-reset key on a 409.
pub const RESET_KEY_HEADER: &str = "portico-reset-key";

/// Response header carrying the server's display message on a 412/423.
pub const MESSAGE_HEADER: &str = "message";

/// Errors from the HTTP layer.
#[derive(Debug, Error)]
pub enum AuthApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication rejected: {0}")]
    Rejected(AuthFailureKind),

    #[error("unexpected status: {0}")]
    Status(StatusCode),
}

/// How the server rejected an authentication attempt.
///
/// Classified from the HTTP status of `POST api/authenticate`:
/// - 409 (conflict): the password is expired; the response carries the
///   reset screen in `Location` and a one-time key in `portico-reset-key`
/// - 412: the account is disabled; display message in the `message` header
/// - 423: the account is locked; same header contract
/// - anything else: bad credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailureKind {
    PasswordExpired {
        redirect_screen: String,
        reset_key: String,
    },
    AccountDisabled {
        message: String,
    },
    AccountLocked {
        message: String,
    },
    InvalidCredentials,
}

/// What the caller should do with a rejected login: either navigate to a
/// reset screen (no error display) or show a two-line error dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDisposition {
    Redirect { target: String },
    ShowError { headline: String, follow_up: String },
}

impl AuthFailureKind {
    pub fn classify(status: StatusCode, headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        match status.as_u16() {
            409 => AuthFailureKind::PasswordExpired {
                redirect_screen: header(LOCATION.as_str()),
                reset_key: header(RESET_KEY_HEADER),
            },
            412 => AuthFailureKind::AccountDisabled {
                message: header(MESSAGE_HEADER),
            },
            423 => AuthFailureKind::AccountLocked {
                message: header(MESSAGE_HEADER),
            },
            _ => AuthFailureKind::InvalidCredentials,
        }
    }

    pub fn disposition(&self) -> FailureDisposition {
        match self {
            AuthFailureKind::PasswordExpired {
                redirect_screen,
                reset_key,
            } => FailureDisposition::Redirect {
                target: format!("{}?key={}", redirect_screen, reset_key),
            },
            AuthFailureKind::AccountDisabled { message } => FailureDisposition::ShowError {
                headline: message.clone(),
                follow_up: "Please contact your Administrator.".to_string(),
            },
            AuthFailureKind::AccountLocked { message } => FailureDisposition::ShowError {
                headline: message.clone(),
                follow_up: "Please try to login later.".to_string(),
            },
            AuthFailureKind::InvalidCredentials => FailureDisposition::ShowError {
                headline: "Your user credentials are incorrect.".to_string(),
                follow_up: "Please review your username and password.".to_string(),
            },
        }
    }
}

impl fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailureKind::PasswordExpired { .. } => write!(f, "password expired"),
            AuthFailureKind::AccountDisabled { .. } => write!(f, "account disabled"),
            AuthFailureKind::AccountLocked { .. } => write!(f, "account locked"),
            AuthFailureKind::InvalidCredentials => write!(f, "invalid credentials"),
        }
    }
}
