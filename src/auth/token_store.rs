use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File name for the persistent-scope token in the cache directory.
const TOKEN_FILE: &str = "token.json";

/// Opaque authentication token issued by the server.
///
/// The `Debug` impl redacts the value so tokens cannot leak into logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: AuthToken,
}

#[derive(Default)]
struct Scopes {
    persistent: Option<AuthToken>,
    session: Option<AuthToken>,
}

/// Two-scope token cell.
///
/// The *session* scope lives in memory only; the *persistent* scope is
/// mirrored to a JSON file in the cache directory so it survives restarts.
/// At most one scope is populated at any time: writing to one scope clears
/// the other.
///
/// Clones share the same cell. The session controller is the sole writer;
/// the HTTP client reads the store to attach bearer headers.
///
/// Storage is treated as always available: disk errors on the persistent
/// mirror are logged and swallowed, never surfaced to callers.
#[derive(Clone)]
pub struct TokenStore {
    path: PathBuf,
    scopes: Arc<Mutex<Scopes>>,
}

impl TokenStore {
    /// Open a token store backed by `cache_dir`, loading any token left in
    /// the persistent scope by a previous run.
    pub fn open(cache_dir: PathBuf) -> Self {
        let store = Self {
            path: cache_dir.join(TOKEN_FILE),
            scopes: Arc::new(Mutex::new(Scopes::default())),
        };
        store.load();
        store
    }

    /// Store a token, clearing the other scope first.
    pub fn store(&self, token: AuthToken, persistent: bool) {
        let mut scopes = self.scopes.lock();
        if persistent {
            scopes.session = None;
            scopes.persistent = Some(token);
        } else {
            scopes.persistent = None;
            scopes.session = Some(token);
        }
        self.flush(&scopes);
    }

    /// Return the current token, checking the persistent scope first.
    pub fn retrieve(&self) -> Option<AuthToken> {
        let scopes = self.scopes.lock();
        scopes.persistent.clone().or_else(|| scopes.session.clone())
    }

    /// Clear both scopes.
    pub fn clear(&self) {
        let mut scopes = self.scopes.lock();
        scopes.persistent = None;
        scopes.session = None;
        self.flush(&scopes);
    }

    fn load(&self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<TokenFile>(&contents) {
                Ok(file) => {
                    debug!("loaded persistent token");
                    self.scopes.lock().persistent = Some(file.token);
                }
                Err(e) => warn!(error = %e, "failed to parse token file, ignoring"),
            },
            Err(e) => warn!(error = %e, "failed to read token file, ignoring"),
        }
    }

    /// Mirror the persistent scope to disk. Best-effort: failures are logged.
    fn flush(&self, scopes: &Scopes) {
        match &scopes.persistent {
            Some(token) => {
                let write = || -> anyhow::Result<()> {
                    if let Some(parent) = self.path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let contents = serde_json::to_string_pretty(&TokenFile {
                        token: token.clone(),
                    })?;
                    std::fs::write(&self.path, contents)?;
                    Ok(())
                };
                if let Err(e) = write() {
                    warn!(error = %e, "failed to persist token");
                }
            }
            None => {
                if self.path.exists() {
                    if let Err(e) = std::fs::remove_file(&self.path) {
                        warn!(error = %e, "failed to remove persisted token");
                    }
                }
            }
        }
    }
}
