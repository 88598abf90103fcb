//! PostgREST client for the hosted tables.
//!
//! Wraps `{url}/rest/v1/{table}` using [`reqwest`]. Reads map [`Query`]
//! onto PostgREST query parameters; writes ask for
//! `Prefer: return=representation` so callers see rows as stored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::ClientError;
use crate::query::Query;
use crate::store::{RemoteStore, Upsert};

/// Re-exported so callers can share one pool without naming `reqwest`.
pub type HttpClient = reqwest::Client;

/// Where the hosted project lives and how long a call may take.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent as `apikey` on every request.
    pub anon_key: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout,
        }
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    /// A client carrying this config's request timeout.
    pub fn http_client(&self) -> Result<HttpClient, ClientError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Bearer token shared between the auth client (writer) and the table
/// client (reader). Falls back to the anon key when nobody is signed in.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(Arc<RwLock<Option<String>>>);

impl AccessToken {
    pub async fn get(&self) -> Option<String> {
        self.0.read().await.clone()
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.0.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.0.write().await = None;
    }
}

/// [`RemoteStore`] over PostgREST.
pub struct RestStore {
    client: reqwest::Client,
    config: RestConfig,
    token: AccessToken,
}

impl RestStore {
    pub fn new(config: RestConfig, token: AccessToken) -> Result<Self, ClientError> {
        Ok(Self {
            client: config.http_client()?,
            config,
            token,
        })
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling with the
    /// auth client).
    pub fn with_client(client: reqwest::Client, config: RestConfig, token: AccessToken) -> Self {
        Self {
            client,
            config,
            token,
        }
    }

    // ---- private helpers ----

    async fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self
            .token
            .get()
            .await
            .unwrap_or_else(|| self.config.anon_key.clone());
        self.client
            .request(method, self.config.rest_url(table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ClientError::Timeout(self.config.timeout)
            } else {
                ClientError::Request(err)
            }
        })?;
        Self::ensure_success(response).await
    }

    /// Ensure the response has a success status code, turning the body of
    /// a failure into a typed [`ClientError`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
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

    async fn parse_rows(response: reqwest::Response) -> Result<Vec<Value>, ClientError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Only the filters of a query; writes and counts ignore range and order.
fn filter_params(query: &Query) -> Vec<(String, String)> {
    Query {
        filters: query.filters.clone(),
        ..Query::default()
    }
    .to_params()
}

/// Total from a `Content-Range` header such as `0-4/12` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError> {
        tracing::debug!(table, "Remote select");
        let mut params = query.to_params();
        if query.columns.is_none() {
            params.insert(0, ("select".to_string(), "*".to_string()));
        }
        let builder = self.request(Method::GET, table).await.query(&params);
        Self::parse_rows(self.send(builder).await?).await
    }

    async fn count(&self, table: &str, query: &Query) -> Result<u64, ClientError> {
        tracing::debug!(table, "Remote count");
        let builder = self
            .request(Method::HEAD, table)
            .await
            .query(&filter_params(query))
            .header("Prefer", "count=exact");
        let response = self.send(builder).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| ClientError::Api {
                status: response.status().as_u16(),
                code: None,
                message: "Missing or malformed Content-Range header".to_string(),
            })
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, ClientError> {
        tracing::debug!(table, rows = rows.len(), "Remote insert");
        let builder = self
            .request(Method::POST, table)
            .await
            .header("Prefer", "return=representation")
            .json(&rows);
        Self::parse_rows(self.send(builder).await?).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        upsert: Upsert,
    ) -> Result<Vec<Value>, ClientError> {
        tracing::debug!(table, rows = rows.len(), resolution = upsert.resolution.as_prefer(), "Remote upsert");
        let prefer = format!(
            "resolution={},return=representation",
            upsert.resolution.as_prefer()
        );
        let builder = self
            .request(Method::POST, table)
            .await
            .query(&[("on_conflict", upsert.on_conflict.join(","))])
            .header("Prefer", prefer)
            .json(&rows);
        Self::parse_rows(self.send(builder).await?).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, ClientError> {
        tracing::debug!(table, "Remote update");
        let builder = self
            .request(Method::PATCH, table)
            .await
            .query(&filter_params(query))
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::parse_rows(self.send(builder).await?).await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError> {
        tracing::debug!(table, "Remote delete");
        let builder = self
            .request(Method::DELETE, table)
            .await
            .query(&filter_params(query))
            .header("Prefer", "return=representation");
        Self::parse_rows(self.send(builder).await?).await
    }
}
