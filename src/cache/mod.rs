//! Lazy, memoized "last session info" derivation.
//!
//! The audit-display layer reads this cache to show the user when and from
//! where they previously logged in, and how many failed attempts happened
//! in between. Population is lazy; the session controller's lifecycle
//! events invalidate it.

pub mod last_session;

pub use last_session::{
    derive_last_session_info, spawn_invalidation_listener, LastSessionInfoCache, LastSessionRead,
};
