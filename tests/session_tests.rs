use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use resolution_client::auth::{
    FileSessionStore, MemorySessionStore, SessionState, SessionStore, TOKEN_KEY, USER_KEY,
};
use resolution_client::config::ClientOptions;
use resolution_client::error::Error;
use resolution_client::Resolution;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json(verified: i64) -> serde_json::Value {
    json!({"id": 7, "first_name": "Ana", "last_name": "Pérez",
           "email": "ana@example.com", "verified": verified, "is_admin": false})
}

#[tokio::test]
async fn test_login_persists_and_logout_clears() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "tok", "user": user_json(1)})),
        )
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let store = Arc::new(MemorySessionStore::new());
    let context = resolution.session_with_store(store.clone());

    assert!(context.is_loading());
    assert_eq!(context.restore().await.unwrap(), SessionState::Anonymous);

    let user = context.login("ana@example.com", "secreto1").await.unwrap();
    assert_eq!(user.id, 7);
    assert!(context.is_authenticated());
    assert_eq!(context.token().as_deref(), Some("tok"));
    assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok"));
    assert!(store.get(USER_KEY).await.unwrap().is_some());

    context.logout().await.unwrap();
    assert_eq!(context.state(), SessionState::Anonymous);
    assert!(store.get(TOKEN_KEY).await.unwrap().is_none());
    assert!(store.get(USER_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unverified_login_stays_anonymous() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "tok", "user": user_json(0)})),
        )
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let store = Arc::new(MemorySessionStore::new());
    let context = resolution.session_with_store(store.clone());

    let err = context.login("ana@example.com", "secreto1").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert!(!context.is_authenticated());
    assert!(store.get(TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_from_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let options = ClientOptions::default()
        .with_origin("http://127.0.0.1:1")
        .with_session_path(path.clone());
    let resolution = Resolution::new_with_options(options);

    let store = FileSessionStore::new(path.clone());
    store.set(TOKEN_KEY, "tok").await.unwrap();
    store.set(USER_KEY, &user_json(1).to_string()).await.unwrap();

    let context = resolution.session();
    match context.restore().await.unwrap() {
        SessionState::Authenticated(session) => {
            assert_eq!(session.token, "tok");
            assert_eq!(session.user.email, "ana@example.com");
        }
        other => panic!("expected an authenticated session, got {:?}", other),
    }
    assert!(!context.is_admin());
}

#[tokio::test]
async fn test_restore_rejects_unverified_and_corrupt_users() {
    let resolution = Resolution::new("http://127.0.0.1:1");

    let store = Arc::new(MemorySessionStore::new());
    store.set(TOKEN_KEY, "tok").await.unwrap();
    store.set(USER_KEY, &user_json(0).to_string()).await.unwrap();
    let context = resolution.session_with_store(store.clone());
    assert_eq!(context.restore().await.unwrap(), SessionState::Anonymous);

    store.set(USER_KEY, "{broken").await.unwrap();
    let context = resolution.session_with_store(store.clone());
    assert_eq!(context.restore().await.unwrap(), SessionState::Anonymous);
    assert!(store.get(TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_from_legacy_token() {
    let mock_server = MockServer::start().await;
    let token = STANDARD.encode("7:ana@example.com");

    Mock::given(method("GET"))
        .and(path("/api/user/7"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let store = Arc::new(MemorySessionStore::new());
    store.set(TOKEN_KEY, &token).await.unwrap();

    let context = resolution.session_with_store(store.clone());
    assert!(matches!(
        context.restore().await.unwrap(),
        SessionState::Authenticated(_)
    ));
    assert!(store.get(USER_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_refresh_user_revalidates_verified_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "tok", "user": user_json(1)})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/user/7"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(0)))
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let store = Arc::new(MemorySessionStore::new());
    let context = resolution.session_with_store(store.clone());

    let err = context.refresh_user().await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));

    context.login("ana@example.com", "secreto1").await.unwrap();
    let refreshed = context.refresh_user().await.unwrap();
    assert!(!refreshed.verified);
    assert!(!context.is_authenticated());

    // a later start must not sign the stale verified copy back in
    let next_run = resolution.session_with_store(store.clone());
    assert_eq!(next_run.restore().await.unwrap(), SessionState::Anonymous);
}
