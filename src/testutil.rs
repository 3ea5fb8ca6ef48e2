//! Scriptable `AuthBackend` mock shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{AuthApiError, AuthBackend};
use crate::auth::{AuthToken, Credentials};
use crate::models::{Account, AuditEvent};

/// Mock backend: counts calls, pops scripted results, and can park a call
/// on a gate until the test releases it. Unscripted calls succeed with
/// defaults ("mock-token", account "admin", empty audit feed).
#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    authenticate_calls: AtomicUsize,
    keep_alive_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    audit_calls: AtomicUsize,
    logout_hangs: AtomicBool,
    authenticate_results: Mutex<VecDeque<Result<AuthToken, AuthApiError>>>,
    account_results: Mutex<VecDeque<Result<Account, AuthApiError>>>,
    keep_alive_results: Mutex<VecDeque<Result<(), AuthApiError>>>,
    audit_results: Mutex<VecDeque<Result<Vec<AuditEvent>, AuthApiError>>>,
    logout_tokens: Mutex<Vec<AuthToken>>,
    audits: Mutex<Vec<AuditEvent>>,
    auth_gate: Mutex<Option<Arc<Notify>>>,
    audit_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticate_calls(&self) -> usize {
        self.inner.authenticate_calls.load(Ordering::SeqCst)
    }

    pub fn keep_alive_calls(&self) -> usize {
        self.inner.keep_alive_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.inner.logout_calls.load(Ordering::SeqCst)
    }

    pub fn audit_calls(&self) -> usize {
        self.inner.audit_calls.load(Ordering::SeqCst)
    }

    /// Token carried by the most recent logout notification.
    pub fn last_logout_token(&self) -> Option<AuthToken> {
        self.inner.logout_tokens.lock().last().cloned()
    }

    pub fn push_authenticate_result(&self, result: Result<AuthToken, AuthApiError>) {
        self.inner.authenticate_results.lock().push_back(result);
    }

    pub fn push_account_result(&self, result: Result<Account, AuthApiError>) {
        self.inner.account_results.lock().push_back(result);
    }

    pub fn push_keep_alive_result(&self, result: Result<(), AuthApiError>) {
        self.inner.keep_alive_results.lock().push_back(result);
    }

    pub fn push_audit_result(&self, result: Result<Vec<AuditEvent>, AuthApiError>) {
        self.inner.audit_results.lock().push_back(result);
    }

    pub fn set_audits(&self, audits: Vec<AuditEvent>) {
        *self.inner.audits.lock() = audits;
    }

    pub fn set_logout_hangs(&self, hangs: bool) {
        self.inner.logout_hangs.store(hangs, Ordering::SeqCst);
    }

    /// Park `authenticate` calls until the returned gate is notified.
    pub fn gate_authenticate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.auth_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Park `fetch_audits` calls until the returned gate is notified.
    pub fn gate_audits(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.audit_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    fn default_account() -> Account {
        Account {
            login: "admin".to_string(),
            email: Some("admin@localhost".to_string()),
            authorities: vec!["ROLE_USER".to_string()],
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<AuthToken, AuthApiError> {
        self.inner.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.inner.auth_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.inner.authenticate_results.lock().pop_front() {
            Some(result) => result,
            None => Ok(AuthToken::new("mock-token")),
        }
    }

    async fn keep_alive(&self) -> Result<(), AuthApiError> {
        self.inner.keep_alive_calls.fetch_add(1, Ordering::SeqCst);
        match self.inner.keep_alive_results.lock().pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }

    async fn send_logout_notification(&self, token: AuthToken) -> Result<(), AuthApiError> {
        self.inner.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.logout_tokens.lock().push(token);
        if self.inner.logout_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn fetch_account(&self) -> Result<Account, AuthApiError> {
        match self.inner.account_results.lock().pop_front() {
            Some(result) => result,
            None => Ok(Self::default_account()),
        }
    }

    async fn fetch_audits(&self, _login: &str) -> Result<Vec<AuditEvent>, AuthApiError> {
        self.inner.audit_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.inner.audit_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.inner.audit_results.lock().pop_front() {
            Some(result) => result,
            None => Ok(self.inner.audits.lock().clone()),
        }
    }
}
