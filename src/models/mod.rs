//! Domain and wire types shared across the crate.
//!
//! These mirror the server's JSON payloads:
//! - `Account`: the authenticated identity returned by `GET api/account`
//! - `AuditEvent`: one entry of the newest-first audit feed
//! - `SessionInfo`: the derived "previous successful login" summary

pub mod account;
pub mod audit;

pub use account::Account;
pub use audit::{AuditEvent, AuditEventData, SessionInfo};
