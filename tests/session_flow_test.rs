//! End-to-end session flows: real SessionController over a real ApiClient,
//! against a mock server.

use std::time::Duration;

use mockito::Server;
use tempfile::TempDir;

use portico_core::api::ApiClient;
use portico_core::auth::{
    AuthToken, Credentials, LoginAttemptState, LoginError, LogoutReason, SessionController,
    TokenStore,
};
use portico_core::cache::{LastSessionInfoCache, LastSessionRead};

fn session_for(server: &Server) -> (TempDir, TokenStore, SessionController<ApiClient>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let tokens = TokenStore::open(dir.path().to_path_buf());
    let client = ApiClient::new(server.url(), tokens.clone()).expect("client");
    let controller = SessionController::new(client, tokens.clone());
    (dir, tokens, controller)
}

#[tokio::test]
async fn test_login_stores_session_token_and_fetches_identity() {
    let mut server = Server::new_async().await;
    let _auth = server
        .mock("POST", "/api/authenticate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_token": "jwt-abc"}"#)
        .expect(1)
        .create_async()
        .await;
    let account = server
        .mock("GET", "/api/account")
        .match_header("authorization", "Bearer jwt-abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"login": "admin"}"#)
        .expect(1)
        .create_async()
        .await;

    let (_dir, tokens, session) = session_for(&server);
    session
        .login(Credentials::new("admin", "secret"))
        .await
        .expect("login");

    // Identity is there the moment login returns, and the token went to the
    // session scope.
    assert_eq!(session.current_account().unwrap().login, "admin");
    assert_eq!(tokens.retrieve(), Some(AuthToken::new("jwt-abc")));
    assert_eq!(session.attempt_state(), LoginAttemptState::Authenticated);
    account.assert_async().await;
}

#[tokio::test]
async fn test_rejected_login_keeps_store_empty() {
    let mut server = Server::new_async().await;
    let _auth = server
        .mock("POST", "/api/authenticate")
        .with_status(401)
        .create_async()
        .await;

    let (_dir, tokens, session) = session_for(&server);
    let err = session
        .login(Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, LoginError::Rejected(_)));
    assert_eq!(tokens.retrieve(), None);
}

#[tokio::test]
async fn test_logout_clears_token_even_when_notification_fails() {
    let mut server = Server::new_async().await;
    let _auth = server
        .mock("POST", "/api/authenticate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_token": "jwt-abc"}"#)
        .create_async()
        .await;
    let _account = server
        .mock("GET", "/api/account")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"login": "admin"}"#)
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/api/logout")
        .with_status(500)
        .create_async()
        .await;

    let (_dir, tokens, session) = session_for(&server);
    session
        .login(Credentials::new("admin", "secret"))
        .await
        .expect("login");

    session.logout(LogoutReason::LogoutButton);

    // Local logout is already done, whatever the server said.
    assert_eq!(tokens.retrieve(), None);
    assert_eq!(session.attempt_state(), LoginAttemptState::Idle);
    assert!(session.current_account().is_none());

    // The notification was still attempted, best-effort.
    tokio::time::sleep(Duration::from_millis(200)).await;
    logout.assert_async().await;
}

#[tokio::test]
async fn test_logout_notification_carries_bearer_token() {
    let mut server = Server::new_async().await;
    let _auth = server
        .mock("POST", "/api/authenticate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_token": "jwt-abc"}"#)
        .create_async()
        .await;
    let _account = server
        .mock("GET", "/api/account")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"login": "admin"}"#)
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/api/logout")
        .match_header("authorization", "Bearer jwt-abc")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (_dir, tokens, session) = session_for(&server);
    session
        .login(Credentials::new("admin", "secret"))
        .await
        .expect("login");

    session.logout(LogoutReason::LogoutButton);
    assert_eq!(tokens.retrieve(), None);

    // The request authenticates even though the local store is cleared.
    tokio::time::sleep(Duration::from_millis(200)).await;
    logout.assert_async().await;
}

#[tokio::test]
async fn test_last_session_cache_reads_audit_feed() {
    let mut server = Server::new_async().await;
    let _audits = server
        .mock("GET", "/api/audits/admin")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"type": "AUTHENTICATION_SUCCESS", "timestamp": "2024-05-05T10:00:00Z",
                 "data": {"remoteAddress": "10.0.0.5"}},
                {"type": "AUTHENTICATION_FAILURE", "timestamp": "2024-05-04T10:00:00Z", "data": {}},
                {"type": "AUTHENTICATION_FAILURE", "timestamp": "2024-05-03T10:00:00Z", "data": {}},
                {"type": "AUTHENTICATION_SUCCESS", "timestamp": "2024-05-02T10:00:00Z",
                 "data": {"remoteAddress": "10.0.0.1"}},
                {"type": "AUTHENTICATION_FAILURE", "timestamp": "2024-05-01T10:00:00Z", "data": {}}
            ]"#,
        )
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let tokens = TokenStore::open(dir.path().to_path_buf());
    let client = ApiClient::new(server.url(), tokens).expect("client");
    let cache = LastSessionInfoCache::new(client);

    assert_eq!(cache.read("admin"), LastSessionRead::Fetching);

    let info = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let LastSessionRead::Available(info) = cache.read("admin") {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("cache never became ready")
    .expect("info");

    assert_eq!(info.remote_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(info.failed_attempts_since_last_success, 2);
}
