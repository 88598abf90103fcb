//! Client-side deadlines for remote calls.
//!
//! [`TimedStore`] and [`TimedAuth`] wrap any implementation so that every
//! call fails with [`ClientError::Timeout`] once the deadline passes,
//! independent of the transport.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{AuthApi, AuthEvent, AuthUser, Session, SignUpOutcome};
use crate::error::ClientError;
use crate::query::Query;
use crate::store::{RemoteStore, Upsert};

/// Await `fut` for at most `limit`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Remote call timed out");
            Err(ClientError::Timeout(limit))
        }
    }
}

pub struct TimedStore {
    inner: Arc<dyn RemoteStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn RemoteStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl RemoteStore for TimedStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError> {
        with_timeout(self.limit, self.inner.select(table, query)).await
    }

    async fn count(&self, table: &str, query: &Query) -> Result<u64, ClientError> {
        with_timeout(self.limit, self.inner.count(table, query)).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, ClientError> {
        with_timeout(self.limit, self.inner.insert(table, rows)).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        upsert: Upsert,
    ) -> Result<Vec<Value>, ClientError> {
        with_timeout(self.limit, self.inner.upsert(table, rows, upsert)).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, ClientError> {
        with_timeout(self.limit, self.inner.update(table, patch, query)).await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError> {
        with_timeout(self.limit, self.inner.delete(table, query)).await
    }
}

pub struct TimedAuth {
    inner: Arc<dyn AuthApi>,
    limit: Duration,
}

impl TimedAuth {
    pub fn new(inner: Arc<dyn AuthApi>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl AuthApi for TimedAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        with_timeout(self.limit, self.inner.sign_in(email, password)).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, ClientError> {
        with_timeout(self.limit, self.inner.sign_up(email, password, metadata)).await
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        with_timeout(self.limit, self.inner.sign_out()).await
    }

    async fn get_session(&self) -> Result<Option<Session>, ClientError> {
        with_timeout(self.limit, self.inner.get_session()).await
    }

    async fn get_user(&self) -> Result<AuthUser, ClientError> {
        with_timeout(self.limit, self.inner.get_user()).await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.subscribe()
    }
}
