//! GoTrue client for `{url}/auth/v1`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

use crate::auth::{AuthApi, AuthEvent, AuthEventBus, AuthUser, Session, SignUpOutcome};
use crate::error::ClientError;
use crate::rest::{AccessToken, RestConfig};

/// [`AuthApi`] over GoTrue. Holds the current session in memory and
/// mirrors its access token into the shared [`AccessToken`].
pub struct RestAuth {
    client: reqwest::Client,
    config: RestConfig,
    token: AccessToken,
    session: RwLock<Option<Session>>,
    events: AuthEventBus,
}

/// `/signup` answers with a session when confirmation is off, otherwise
/// with the user alone (bare, or wrapped as `{user}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    Wrapped { user: AuthUser },
    User(AuthUser),
}

impl RestAuth {
    pub fn new(config: RestConfig, token: AccessToken) -> Result<Self, ClientError> {
        Ok(Self::with_client(config.http_client()?, config, token))
    }

    pub fn with_client(client: reqwest::Client, config: RestConfig, token: AccessToken) -> Self {
        Self {
            client,
            config,
            token,
            session: RwLock::new(None),
            events: AuthEventBus::default(),
        }
    }

    /// Adopt a session persisted elsewhere (e.g. by a previous run).
    pub async fn set_session(&self, session: Session) {
        self.store_session(session).await;
    }

    // ---- private helpers ----

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.config.auth_url(path))
            .header("apikey", &self.config.anon_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ClientError::Timeout(self.config.timeout)
            } else {
                ClientError::Request(err)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::from_status(status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn store_session(&self, session: Session) {
        self.token.set(session.access_token.clone()).await;
        *self.session.write().await = Some(session);
    }

    async fn clear_session(&self) -> Option<Session> {
        self.token.clear().await;
        self.session.write().await.take()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, ClientError> {
        let builder = self
            .post("token?grant_type=refresh_token")
            .json(&serde_json::json!({ "refresh_token": refresh_token }));
        let session: Session = self.send(builder).await?.json().await?;
        self.store_session(session.clone()).await;
        self.events.publish(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthApi for RestAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let builder = self
            .post("token?grant_type=password")
            .json(&serde_json::json!({ "email": email, "password": password }));
        let session: Session = self.send(builder).await?.json().await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.store_session(session.clone()).await;
        self.events.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, ClientError> {
        let builder = self.post("signup").json(&serde_json::json!({
            "email": email,
            "password": password,
            "data": metadata,
        }));
        let outcome = match self.send(builder).await?.json().await? {
            SignUpResponse::Session(session) => SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            },
            SignUpResponse::Wrapped { user } | SignUpResponse::User(user) => SignUpOutcome {
                user,
                session: None,
            },
        };
        tracing::info!(user_id = %outcome.user.id, confirmed = outcome.session.is_some(), "Signed up");
        if let Some(session) = &outcome.session {
            self.store_session(session.clone()).await;
            self.events.publish(AuthEvent::SignedIn(session.clone()));
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let previous = self.clear_session().await;
        self.events.publish(AuthEvent::SignedOut);
        let Some(session) = previous else {
            return Ok(());
        };
        let builder = self.post("logout").bearer_auth(&session.access_token);
        self.send(builder).await.map(|_| ())
    }

    async fn get_session(&self) -> Result<Option<Session>, ClientError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        match session.refresh_token.as_deref() {
            Some(refresh_token) => self.refresh(refresh_token).await.map(Some),
            None => {
                self.clear_session().await;
                self.events.publish(AuthEvent::SignedOut);
                Ok(None)
            }
        }
    }

    async fn get_user(&self) -> Result<AuthUser, ClientError> {
        let session = self
            .get_session()
            .await?
            .ok_or(ClientError::NotAuthenticated)?;
        let builder = self
            .client
            .get(self.config.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token);
        Ok(self.send(builder).await?.json().await?)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
