use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::AuthBackend;
use crate::auth::SessionEvent;
use crate::models::{AuditEvent, SessionInfo};

/// The memoization slot. `Pending` is set before the fetch is issued so a
/// concurrent read never starts a second one.
enum CacheSlot {
    Empty,
    Pending,
    Ready(Option<SessionInfo>),
}

/// What a cache read observed.
#[derive(Debug, Clone, PartialEq)]
pub enum LastSessionRead {
    /// A fetch is outstanding; ask again later.
    Fetching,
    /// The derivation is done. `None` means no prior successful login was
    /// found (or the fetch failed, which degrades silently).
    Available(Option<SessionInfo>),
}

/// Memoized summary of the current user's previous successful login.
///
/// Populated lazily from the audit feed on first read, once per process
/// lifetime per user; login attempts and logouts invalidate it. Clones
/// share the slot.
#[derive(Clone)]
pub struct LastSessionInfoCache<B: AuthBackend> {
    backend: B,
    slot: Arc<Mutex<CacheSlot>>,
}

impl<B: AuthBackend> LastSessionInfoCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slot: Arc::new(Mutex::new(CacheSlot::Empty)),
        }
    }

    /// Read the cached value, triggering the fetch on first use.
    ///
    /// Non-blocking: while the fetch is outstanding every caller observes
    /// `Fetching`, and exactly one fetch is ever issued per population.
    pub fn read(&self, login: &str) -> LastSessionRead {
        let mut slot = self.slot.lock();
        match &*slot {
            CacheSlot::Ready(info) => LastSessionRead::Available(info.clone()),
            CacheSlot::Pending => LastSessionRead::Fetching,
            CacheSlot::Empty => {
                // Mark pending before the fetch is issued, not after it
                // returns; a second read racing with the fetch must not
                // start a duplicate.
                *slot = CacheSlot::Pending;
                drop(slot);

                let backend = self.backend.clone();
                let cache_slot = Arc::clone(&self.slot);
                let login = login.to_string();
                tokio::spawn(async move {
                    let info = match backend.fetch_audits(&login).await {
                        Ok(events) => derive_last_session_info(&events),
                        Err(e) => {
                            debug!(error = %e, "audit fetch failed, no last session info");
                            None
                        }
                    };
                    *cache_slot.lock() = CacheSlot::Ready(info);
                });
                LastSessionRead::Fetching
            }
        }
    }

    /// Reset to empty, forcing re-derivation on the next read.
    pub fn invalidate(&self) {
        *self.slot.lock() = CacheSlot::Empty;
    }
}

/// Derive the previous-session summary from a newest-first audit feed.
///
/// The first element is the login attempt currently in progress and is
/// skipped. Within the remainder, the first authentication success is the
/// previous session; the events before it are the failed attempts since.
pub fn derive_last_session_info(events: &[AuditEvent]) -> Option<SessionInfo> {
    let (_, earlier) = events.split_first()?;
    let k = earlier.iter().position(|e| e.is_authentication_success())?;
    let success = &earlier[k];
    Some(SessionInfo {
        remote_address: success.data.remote_address.clone(),
        time: success.timestamp,
        failed_attempts_since_last_success: k,
    })
}

/// Invalidate `cache` on every session lifecycle event. The session
/// controller only announces that something changed; the cache contents
/// stay its own business.
pub fn spawn_invalidation_listener<B: AuthBackend>(
    cache: LastSessionInfoCache<B>,
    mut events: broadcast::Receiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(_) => cache.invalidate(),
                // Missed events still mean "something changed".
                Err(broadcast::error::RecvError::Lagged(_)) => cache.invalidate(),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
