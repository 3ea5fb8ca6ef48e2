//! Modal/dialog lifecycle management.
//!
//! This module provides:
//! - `DialogLifecycleManager`: the single active dialog reference, reconciled
//!   against router navigation events
//! - `KeepAliveMonitor`: the recurring session ping owned by "in progress"
//!   dialogs
//!
//! Rendering is not done here; the UI layer observes the active dialog and
//! draws it however it likes.

pub mod keep_alive;
pub mod manager;

pub use keep_alive::{KeepAliveMonitor, MonitorState, KEEP_ALIVE_INTERVAL};
pub use manager::{screen_base, DialogContent, DialogHandle, DialogLifecycleManager, DismissReason};
