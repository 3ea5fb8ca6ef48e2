//! Portico core - client-side authentication and session lifecycle.
//!
//! This crate is the coordination core of the Portico client: token
//! handling across two storage scopes, a serialized login/logout state
//! machine with differentiated failure handling, a cancellable session
//! keep-alive timer, a navigation-aware dialog lifecycle manager, and a
//! memoized last-session-info cache. Rendering, input validation, and
//! list mechanics live in the embedding application; the server is reached
//! only through the `AuthBackend` seam.
//!
//! Construct the pieces at your composition root and pass them by
//! reference:
//!
//! ```no_run
//! use portico_core::api::ApiClient;
//! use portico_core::auth::{SessionController, TokenStore};
//! use portico_core::cache::{spawn_invalidation_listener, LastSessionInfoCache};
//! use portico_core::config::Config;
//! use portico_core::dialog::DialogLifecycleManager;
//!
//! # fn main() -> anyhow::Result<()> {
//! # let rt = tokio::runtime::Runtime::new()?;
//! # let _guard = rt.enter();
//! let config = Config::load()?;
//! let tokens = TokenStore::open(config.cache_dir()?);
//! let client = ApiClient::new(config.server_url.clone(), tokens.clone())?;
//!
//! let session = SessionController::new(client.clone(), tokens);
//! let dialogs = DialogLifecycleManager::new(client.clone());
//! let last_session = LastSessionInfoCache::new(client);
//! spawn_invalidation_listener(last_session.clone(), session.subscribe());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dialog;
pub mod models;

#[cfg(test)]
mod testutil;

pub use api::{ApiClient, AuthApiError, AuthBackend, AuthFailureKind, FailureDisposition};
pub use auth::{
    AuthToken, Credentials, LoginAttemptState, LoginError, LogoutReason, SessionController,
    SessionEvent, TokenStore,
};
pub use cache::{LastSessionInfoCache, LastSessionRead};
pub use config::Config;
pub use dialog::{DialogContent, DialogLifecycleManager, DismissReason, KeepAliveMonitor};
pub use models::{Account, AuditEvent, SessionInfo};
