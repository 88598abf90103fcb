//! Authentication seam: credentials, sessions, and auth state events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tymelyne_core::types::{Timestamp, UserId};

use crate::error::ClientError;

/// An authenticated user as the auth service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata supplied at sign-up (`first_name`, `last_name`,
    /// `username`).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// A string field of the sign-up metadata, if present and non-empty.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn expires_at_time(&self) -> Option<Timestamp> {
        self.expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Sessions without an expiry never expire on the client side.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at_time().is_some_and(|at| at <= now)
    }
}

/// Result of a registration. `session` is `None` when the service requires
/// email confirmation before the first sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// Auth state change pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(AuthUser),
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
            Self::UserUpdated(_) => "USER_UPDATED",
        }
    }
}

/// Credential and session operations against the auth service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, ClientError>;

    /// End the current session. The local session is cleared even when the
    /// remote call fails.
    async fn sign_out(&self) -> Result<(), ClientError>;

    /// The current session, refreshed if it has expired and can be.
    async fn get_session(&self) -> Result<Option<Session>, ClientError>;

    /// The user behind the current session.
    async fn get_user(&self) -> Result<AuthUser, ClientError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

// ---------------------------------------------------------------------------
// AuthEventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of [`AuthEvent`]s to any number of listeners.
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to current subscribers. Dropped if nobody listens.
    pub fn publish(&self, event: AuthEvent) {
        tracing::debug!(event = event.name(), "Auth event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
