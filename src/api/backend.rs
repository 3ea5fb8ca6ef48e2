use async_trait::async_trait;

use crate::auth::{AuthToken, Credentials};
use crate::models::{Account, AuditEvent};

use super::AuthApiError;

/// The narrow seam to the server.
///
/// The session controller, keep-alive monitor, and last-session cache are
/// written against this trait; `ApiClient` is the production
/// implementation. Implementations must be cheap to clone, since callers
/// clone into spawned tasks.
#[async_trait]
pub trait AuthBackend: Clone + Send + Sync + 'static {
    /// `POST api/authenticate` with the given credentials, returning the
    /// issued token or the server's rejection.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, AuthApiError>;

    /// `GET api/keep-alive-session`: a no-op request that extends the
    /// server-side session.
    async fn keep_alive(&self) -> Result<(), AuthApiError>;

    /// `POST api/logout`: best-effort; callers ignore the outcome. Takes
    /// the session token explicitly because the shared store is already
    /// cleared by the time the request goes out.
    async fn send_logout_notification(&self, token: AuthToken) -> Result<(), AuthApiError>;

    /// `GET api/account`: the authenticated identity.
    async fn fetch_account(&self) -> Result<Account, AuthApiError>;

    /// `GET api/audits/{login}`: the user's audit feed, newest first.
    async fn fetch_audits(&self, login: &str) -> Result<Vec<AuditEvent>, AuthApiError>;
}
