//! Navigation-aware lifecycle of the single active dialog.
//!
//! At most one dialog reference is live at a time; opening a new one
//! replaces, never stacks. On every "navigation permitted" event from the
//! router the manager compares screen base ids and dismisses a dialog that
//! belongs to the screen being left. "In progress" dialogs are special:
//! their creation is deferred so fast operations never flash a modal, and
//! they own a keep-alive monitor that must be stopped on every exit path.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::AuthBackend;

use super::keep_alive::{KeepAliveMonitor, KEEP_ALIVE_INTERVAL};

/// Delay before an "in progress" dialog is actually created.
/// Operations finishing faster than this never show a dialog at all.
pub const IN_PROGRESS_OPEN_DELAY: Duration = Duration::from_millis(500);

/// Characters that end a screen base id within a resolved router path.
const ROUTING_AUX_CHARS: &[char] = &['(', ')', '/', '?', '&'];

/// The screen base id of a resolved path: the longest prefix (after one
/// leading separator) free of routing-auxiliary characters.
pub fn screen_base(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    trimmed
        .chars()
        .take_while(|c| !ROUTING_AUX_CHARS.contains(c))
        .collect()
}

/// What the active dialog displays. The UI layer renders this; the manager
/// only tracks identity and lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogContent {
    General {
        title: String,
        body: Vec<String>,
        button: String,
    },
    GeneralError {
        message: String,
    },
    InProgress,
}

/// Why a dialog went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// The user navigated to a different screen.
    Navigation,
    /// A newer dialog took its place.
    Replaced,
    /// Explicitly closed.
    Closed,
}

impl fmt::Display for DismissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DismissReason::Navigation => write!(f, "navigation"),
            DismissReason::Replaced => write!(f, "replaced"),
            DismissReason::Closed => write!(f, "closed"),
        }
    }
}

/// Handle returned to whoever opened a dialog; resolves when it is
/// dismissed.
pub struct DialogHandle {
    dismissed: oneshot::Receiver<DismissReason>,
}

impl DialogHandle {
    /// Wait for dismissal. `None` if the dialog outlived the manager.
    pub async fn dismissed(self) -> Option<DismissReason> {
        self.dismissed.await.ok()
    }
}

struct ActiveDialog<B: AuthBackend> {
    content: DialogContent,
    screen_base: String,
    monitor: Option<KeepAliveMonitor<B>>,
    dismiss_tx: Option<oneshot::Sender<DismissReason>>,
}

struct DialogState<B: AuthBackend> {
    active: Option<ActiveDialog<B>>,
    current_screen_base_url: String,
    pending_open: Option<JoinHandle<()>>,
    pending_generation: u64,
}

/// Tracks the single active dialog and reconciles it with navigation.
///
/// All mutation happens synchronously under one lock, so navigation events
/// are processed whole, in router-emission order.
pub struct DialogLifecycleManager<B: AuthBackend> {
    backend: B,
    in_progress_delay: Duration,
    keep_alive_interval: Duration,
    inner: Arc<Mutex<DialogState<B>>>,
}

impl<B: AuthBackend> DialogLifecycleManager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_timing(backend, IN_PROGRESS_OPEN_DELAY, KEEP_ALIVE_INTERVAL)
    }

    /// Like `new`, with custom deferral and ping timing.
    pub fn with_timing(
        backend: B,
        in_progress_delay: Duration,
        keep_alive_interval: Duration,
    ) -> Self {
        Self {
            backend,
            in_progress_delay,
            keep_alive_interval,
            inner: Arc::new(Mutex::new(DialogState {
                active: None,
                current_screen_base_url: String::new(),
                pending_open: None,
                pending_generation: 0,
            })),
        }
    }

    /// Handle one "navigation permitted" router event carrying the resolved
    /// destination path. Runs to completion synchronously: dismiss a stale
    /// dialog, then update the current screen base unconditionally.
    pub fn handle_navigation(&self, resolved_path: &str) {
        let new_base = screen_base(resolved_path);
        let mut state = self.inner.lock();
        let stale = state.active.is_some() && state.current_screen_base_url != new_base;
        if stale {
            if let Some(dialog) = state.active.take() {
                debug!(from = %state.current_screen_base_url, to = %new_base, "dismissing dialog on navigation");
                dismiss_dialog(dialog, DismissReason::Navigation);
            }
        }
        state.current_screen_base_url = new_base;
    }

    /// Open a general dialog, replacing any active one immediately.
    pub fn show_general_dialog(
        &self,
        title: impl Into<String>,
        body: Vec<String>,
        button: impl Into<String>,
    ) -> DialogHandle {
        self.open(DialogContent::General {
            title: title.into(),
            body,
            button: button.into(),
        })
    }

    /// Open an error dialog, replacing any active one immediately.
    pub fn show_general_error_dialog(&self, message: impl Into<String>) -> DialogHandle {
        self.open(DialogContent::GeneralError {
            message: message.into(),
        })
    }

    /// Request a blocking "operation in progress" dialog.
    ///
    /// Creation is deferred by the configured delay; invoking this again or
    /// hiding before the delay elapses cancels the pending creation. Once
    /// created, the dialog owns a running keep-alive monitor.
    pub fn show_in_progress_modal(&self) {
        let mut state = self.inner.lock();
        if let Some(pending) = state.pending_open.take() {
            pending.abort();
        }
        state.pending_generation += 1;
        let generation = state.pending_generation;

        let backend = self.backend.clone();
        let delay = self.in_progress_delay;
        let interval = self.keep_alive_interval;
        let inner = Arc::clone(&self.inner);
        state.pending_open = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = inner.lock();
            // A cancel or re-invoke in the meantime wins.
            if state.pending_generation != generation {
                return;
            }
            state.pending_open = None;

            let mut monitor = KeepAliveMonitor::with_interval(backend, interval);
            monitor.start();
            let screen_base = state.current_screen_base_url.clone();
            let replaced = state.active.replace(ActiveDialog {
                content: DialogContent::InProgress,
                screen_base,
                monitor: Some(monitor),
                dismiss_tx: None,
            });
            drop(state);
            if let Some(dialog) = replaced {
                dismiss_dialog(dialog, DismissReason::Replaced);
            }
        }));
    }

    /// Dismiss the in-progress dialog, or cancel its pending creation if
    /// the deferral has not elapsed yet.
    pub fn hide_in_progress_modal(&self) {
        let mut state = self.inner.lock();
        if let Some(pending) = state.pending_open.take() {
            pending.abort();
        }
        state.pending_generation += 1;

        let is_in_progress = matches!(
            state.active.as_ref().map(|d| &d.content),
            Some(DialogContent::InProgress)
        );
        if is_in_progress {
            let dialog = state.active.take();
            drop(state);
            if let Some(dialog) = dialog {
                dismiss_dialog(dialog, DismissReason::Closed);
            }
        }
    }

    /// Dismiss whatever dialog is active.
    pub fn dismiss_active(&self, reason: DismissReason) {
        let dialog = self.inner.lock().active.take();
        if let Some(dialog) = dialog {
            dismiss_dialog(dialog, reason);
        }
    }

    /// Snapshot of the active dialog's content, for rendering.
    pub fn active_dialog(&self) -> Option<DialogContent> {
        self.inner.lock().active.as_ref().map(|d| d.content.clone())
    }

    /// Whether the active in-progress dialog's keep-alive ping has failed.
    /// The monitor already stopped itself; the owner decides what to show.
    pub fn in_progress_ping_failed(&self) -> bool {
        self.inner
            .lock()
            .active
            .as_ref()
            .and_then(|d| d.monitor.as_ref())
            .map(|m| m.ping_failed())
            .unwrap_or(false)
    }

    pub fn current_screen_base(&self) -> String {
        self.inner.lock().current_screen_base_url.clone()
    }

    fn open(&self, content: DialogContent) -> DialogHandle {
        let (tx, rx) = oneshot::channel();
        let mut state = self.inner.lock();
        let screen_base = state.current_screen_base_url.clone();
        let replaced = state.active.replace(ActiveDialog {
            content,
            screen_base,
            monitor: None,
            dismiss_tx: Some(tx),
        });
        drop(state);
        if let Some(dialog) = replaced {
            dismiss_dialog(dialog, DismissReason::Replaced);
        }
        DialogHandle { dismissed: rx }
    }
}

impl<B: AuthBackend> Drop for DialogLifecycleManager<B> {
    // Teardown must not leave a deferred open or a running monitor behind.
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if let Some(pending) = state.pending_open.take() {
            pending.abort();
        }
        if let Some(dialog) = state.active.take() {
            dismiss_dialog(dialog, DismissReason::Closed);
        }
    }
}

/// The one funnel for discarding a dialog: stop its monitor first, then
/// notify the opener. The opener may already be gone; that is expected.
fn dismiss_dialog<B: AuthBackend>(mut dialog: ActiveDialog<B>, reason: DismissReason) {
    if let Some(mut monitor) = dialog.monitor.take() {
        monitor.stop();
    }
    if let Some(tx) = dialog.dismiss_tx.take() {
        let _ = tx.send(reason);
    }
    debug!(%reason, screen = %dialog.screen_base, "dialog dismissed");
}
