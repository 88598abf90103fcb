//! GoTrue request mapping and session bookkeeping.

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use tymelyne_remote::rest::{AccessToken, RestConfig};
use tymelyne_remote::rest_auth::RestAuth;
use tymelyne_remote::{AuthApi, AuthEvent, ClientError, Session};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "8d0f3c1e-5a8e-4b43-9b55-4a0d2b6f1c11";

fn session_body(token: &str, expires_at: i64) -> serde_json::Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": expires_at,
        "refresh_token": "refresh-1",
        "user": {"id": USER_ID, "email": "alex@example.com", "user_metadata": {"username": "alex"}}
    })
}

fn auth(server: &MockServer) -> (RestAuth, AccessToken) {
    let token = AccessToken::default();
    let config = RestConfig::new(server.uri(), "anon-key", Duration::from_secs(5));
    (RestAuth::new(config, token.clone()).unwrap(), token)
}

#[tokio::test]
async fn password_sign_in_stores_session_and_emits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_partial_json(json!({"email": "alex@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("jwt-1", 4_000_000_000)))
        .expect(1)
        .mount(&server)
        .await;

    let (auth, token) = auth(&server);
    let mut events = auth.subscribe();
    let session = auth.sign_in("alex@example.com", "hunter22").await.unwrap();

    assert_eq!(session.user.id, USER_ID.parse::<Uuid>().unwrap());
    assert_eq!(token.get().await.as_deref(), Some("jwt-1"));
    assert_matches!(events.recv().await.unwrap(), AuthEvent::SignedIn(_));
    assert_eq!(auth.get_session().await.unwrap(), Some(session));
}

#[tokio::test]
async fn bad_credentials_are_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let (auth, token) = auth(&server);
    assert_matches!(
        auth.sign_in("alex@example.com", "nope").await,
        Err(ClientError::Auth(msg)) if msg == "Invalid login credentials"
    );
    assert_eq!(token.get().await, None);
}

#[tokio::test]
async fn sign_up_without_confirmation_returns_user_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_partial_json(json!({"data": {"username": "alex"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": USER_ID,
            "email": "alex@example.com",
            "user_metadata": {"username": "alex"}
        })))
        .mount(&server)
        .await;

    let (auth, _) = auth(&server);
    let outcome = auth
        .sign_up("alex@example.com", "hunter22", json!({"username": "alex"}))
        .await
        .unwrap();
    assert_eq!(outcome.user.metadata_str("username"), Some("alex"));
    assert!(outcome.session.is_none());
    assert_eq!(auth.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn sign_out_clears_locally_even_if_remote_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let (auth, token) = auth(&server);
    let session: Session = serde_json::from_value(session_body("jwt-1", 4_000_000_000)).unwrap();
    auth.set_session(session).await;
    let mut events = auth.subscribe();

    assert!(auth.sign_out().await.is_err());
    assert_eq!(token.get().await, None);
    assert_eq!(auth.get_session().await.unwrap(), None);
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
}

#[tokio::test]
async fn expired_session_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(json!({"refresh_token": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("jwt-2", 4_000_000_000)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer jwt-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": USER_ID})))
        .mount(&server)
        .await;

    let (auth, token) = auth(&server);
    let stale: Session = serde_json::from_value(session_body("jwt-1", 1)).unwrap();
    auth.set_session(stale).await;
    let mut events = auth.subscribe();

    let user = auth.get_user().await.unwrap();
    assert_eq!(user.id, USER_ID.parse::<Uuid>().unwrap());
    assert_eq!(token.get().await.as_deref(), Some("jwt-2"));
    assert_matches!(events.recv().await.unwrap(), AuthEvent::TokenRefreshed(_));
}

#[tokio::test]
async fn get_user_without_session() {
    let server = MockServer::start().await;
    let (auth, _) = auth(&server);
    assert_matches!(auth.get_user().await, Err(ClientError::NotAuthenticated));
}
