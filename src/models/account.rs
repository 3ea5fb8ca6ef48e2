use serde::{Deserialize, Serialize};

/// The authenticated identity, as returned by `GET api/account`.
///
/// Readers of the current identity immediately after a successful login
/// always observe a populated `Account`; the session controller fetches it
/// before the login call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub authorities: Vec<String>,
}
