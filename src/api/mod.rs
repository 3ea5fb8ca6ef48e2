//! HTTP layer for the Portico server.
//!
//! This module provides:
//! - `AuthBackend`: the narrow async seam the state machines are written
//!   against
//! - `ApiClient`: the production reqwest implementation
//! - `AuthApiError` / `AuthFailureKind`: transport errors and the server's
//!   authentication-rejection contract (409/412/423 with headers)

pub mod backend;
pub mod client;
pub mod error;

pub use backend::AuthBackend;
pub use client::ApiClient;
pub use error::{AuthApiError, AuthFailureKind, FailureDisposition};
