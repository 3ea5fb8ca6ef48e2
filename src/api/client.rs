//! Production HTTP client for the Portico server.
//!
//! Thin reqwest wrapper implementing `AuthBackend`. The bearer token is
//! read from the shared `TokenStore` on every request, mirroring how the
//! rest of the application observes login/logout without being told.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{AuthToken, Credentials, TokenStore};
use crate::models::{Account, AuditEvent};

use super::error::AuthFailureKind;
use super::{AuthApiError, AuthBackend};

#[derive(Debug, Deserialize)]
struct JwtToken {
    id_token: String,
}

/// API client for the Portico server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a new API client against `base_url`.
    ///
    /// No request timeout is configured; login, keep-alive, and logout
    /// calls are allowed to run as long as the server keeps the connection
    /// open, and the logout path never waits on its request anyway.
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            tokens,
        })
    }

    fn endpoint_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Attach the current token, if any, as a bearer header.
    fn with_bearer(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.retrieve() {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    /// Map a non-success response to `Status`, passing successes through.
    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AuthApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(AuthApiError::Status(response.status()))
        }
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, AuthApiError> {
        let response = self
            .client
            .post(self.endpoint_for("api/authenticate"))
            .json(credentials)
            .send()
            .await?;

        if response.status().is_success() {
            let jwt: JwtToken = response.json().await?;
            Ok(AuthToken::new(jwt.id_token))
        } else {
            let kind = AuthFailureKind::classify(response.status(), response.headers());
            debug!(status = %response.status(), kind = %kind, "authentication rejected");
            Err(AuthApiError::Rejected(kind))
        }
    }

    async fn keep_alive(&self) -> Result<(), AuthApiError> {
        let response = self
            .with_bearer(self.client.get(self.endpoint_for("api/keep-alive-session")))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn send_logout_notification(&self, token: AuthToken) -> Result<(), AuthApiError> {
        let response = self
            .client
            .post(self.endpoint_for("api/logout"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn fetch_account(&self) -> Result<Account, AuthApiError> {
        let response = self
            .with_bearer(self.client.get(self.endpoint_for("api/account")))
            .send()
            .await?;
        let account = Self::check_status(response)?.json().await?;
        Ok(account)
    }

    async fn fetch_audits(&self, login: &str) -> Result<Vec<AuditEvent>, AuthApiError> {
        let url = self.endpoint_for(&format!("api/audits/{}", login));
        let response = self.with_bearer(self.client.get(url)).send().await?;
        let events = Self::check_status(response)?.json().await?;
        Ok(events)
    }
}
