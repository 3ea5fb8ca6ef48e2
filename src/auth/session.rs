//! Login/logout state machine.
//!
//! One `SessionController` per process. It serializes login attempts (a
//! second `login()` while one is in flight is rejected at entry), orders
//! the identity fetch before the login call returns, and guarantees that
//! logout completes locally no matter what the network does.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{AuthApiError, AuthBackend, AuthFailureKind};
use crate::models::Account;

use super::{Credentials, LogoutReason, SessionEvent, TokenStore};

/// Capacity of the session event channel. Events are small and consumers
/// are few; lagging subscribers re-sync by invalidating their state.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Where a login attempt currently stands.
///
/// `Failed` is the resting state after a rejected attempt; like `Idle` it
/// permits a new `login()` call. Only `Authenticating` blocks re-entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAttemptState {
    Idle,
    Authenticating,
    Authenticated,
    Failed(AuthFailureKind),
}

/// Errors surfaced by `SessionController::login`.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("a login attempt is already in progress")]
    AlreadyInProgress,

    #[error("authentication rejected: {0}")]
    Rejected(AuthFailureKind),

    #[error("login failed: {0}")]
    Network(#[source] AuthApiError),
}

impl From<AuthApiError> for LoginError {
    fn from(err: AuthApiError) -> Self {
        match err {
            AuthApiError::Rejected(kind) => LoginError::Rejected(kind),
            other => LoginError::Network(other),
        }
    }
}

struct SessionState {
    attempt: LoginAttemptState,
    account: Option<Account>,
}

/// Login/logout state machine.
///
/// Clones share the same state; the controller is the sole writer of the
/// `TokenStore`. Lifecycle transitions are announced on the `SessionEvent`
/// broadcast channel.
#[derive(Clone)]
pub struct SessionController<B: AuthBackend> {
    backend: B,
    tokens: TokenStore,
    events: broadcast::Sender<SessionEvent>,
    inner: Arc<Mutex<SessionState>>,
}

impl<B: AuthBackend> SessionController<B> {
    pub fn new(backend: B, tokens: TokenStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            tokens,
            events,
            inner: Arc::new(Mutex::new(SessionState {
                attempt: LoginAttemptState::Idle,
                account: None,
            })),
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Authenticate and populate the current identity.
    ///
    /// Rejected at entry if an attempt is already in flight, so rapid
    /// repeated submissions produce exactly one authenticate request and
    /// one token write. On success the token is stored session-scoped and
    /// the identity is fetched before this call returns: a reader of
    /// `current_account()` immediately afterwards always sees a value.
    pub async fn login(&self, credentials: Credentials) -> Result<(), LoginError> {
        let had_session = {
            let mut state = self.inner.lock();
            if state.attempt == LoginAttemptState::Authenticating {
                debug!("login attempt already in progress, rejecting");
                return Err(LoginError::AlreadyInProgress);
            }
            let had_session = state.attempt == LoginAttemptState::Authenticated;
            state.attempt = LoginAttemptState::Authenticating;
            had_session
        };

        let token = match self.backend.authenticate(&credentials).await {
            Ok(token) => token,
            Err(err) => return Err(self.settle_failure(err.into(), had_session)),
        };
        self.tokens.store(token, false);

        // Identity fetch is ordered before the caller's login resolves.
        let account = match self.backend.fetch_account().await {
            Ok(account) => account,
            Err(err) => {
                // A token without an identity is useless; drop it.
                self.tokens.clear();
                return Err(self.settle_failure(err.into(), had_session));
            }
        };

        let login = account.login.clone();
        {
            let mut state = self.inner.lock();
            state.account = Some(account);
            state.attempt = LoginAttemptState::Authenticated;
        }
        info!(login = %login, "authenticated");
        let _ = self
            .events
            .send(SessionEvent::AuthenticationSuccess { login });
        Ok(())
    }

    /// End the session. No-op unless currently authenticated.
    ///
    /// Dependents are notified before the token disappears. For reasons the
    /// server should hear about, a non-retried notification is fired and
    /// forgotten, carrying the token captured before the store is cleared
    /// so the server knows whose session to end; local logout completes
    /// even if the notification never resolves.
    pub fn logout(&self, reason: LogoutReason) {
        {
            let state = self.inner.lock();
            if state.attempt != LoginAttemptState::Authenticated {
                return;
            }
        }
        info!(?reason, "logging out");
        let _ = self.events.send(SessionEvent::Logout { reason });

        if reason.notifies_server() {
            if let Some(token) = self.tokens.retrieve() {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    if let Err(e) = backend.send_logout_notification(token).await {
                        debug!(error = %e, "logout notification failed, ignoring");
                    }
                });
            }
        }

        self.tokens.clear();
        let mut state = self.inner.lock();
        state.attempt = LoginAttemptState::Idle;
        state.account = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().attempt == LoginAttemptState::Authenticated
    }

    pub fn attempt_state(&self) -> LoginAttemptState {
        self.inner.lock().attempt.clone()
    }

    /// The identity fetched by the last successful login.
    pub fn current_account(&self) -> Option<Account> {
        self.inner.lock().account.clone()
    }

    /// Leave `Authenticating`, record the failure, and announce it so the
    /// last-session cache re-derives on its next read.
    ///
    /// A failure on top of an existing session tears that session down
    /// first, as an unauthorized logout: the old token and identity must
    /// not outlive the attempt that invalidated them.
    fn settle_failure(&self, err: LoginError, had_session: bool) -> LoginError {
        warn!(error = %err, "login failed");
        if had_session {
            let _ = self.events.send(SessionEvent::Logout {
                reason: LogoutReason::Unauthorized,
            });
            self.tokens.clear();
        }
        let mut state = self.inner.lock();
        if had_session {
            state.account = None;
        }
        state.attempt = match &err {
            LoginError::Rejected(kind) => LoginAttemptState::Failed(kind.clone()),
            _ => LoginAttemptState::Idle,
        };
        drop(state);
        let _ = self.events.send(SessionEvent::AuthenticationFailure);
        err
    }
}
