//! Authentication module: token storage and the login/logout state machine.
//!
//! This module provides:
//! - `TokenStore`: the two-scope (persistent/session) token cell
//! - `SessionController`: serialized login attempts, ordered identity fetch,
//!   best-effort logout
//! - `SessionEvent`: the typed broadcast channel dependents subscribe to
//!
//! The session controller is the only writer of the token store; the HTTP
//! client reads it to attach bearer headers.

pub mod credentials;
pub mod events;
pub mod session;
pub mod token_store;

pub use credentials::Credentials;
pub use events::{LogoutReason, SessionEvent};
pub use session::{LoginAttemptState, LoginError, SessionController};
pub use token_store::{AuthToken, TokenStore};
