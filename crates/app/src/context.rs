//! Shared handles every service works through.

use std::sync::Arc;
use std::time::Duration;

use tymelyne_remote::rest::{AccessToken, RestConfig, RestStore};
use tymelyne_remote::rest_auth::RestAuth;
use tymelyne_remote::{AuthApi, RemoteStore, TimedAuth, TimedStore};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Remote store and auth client, both bounded by the request timeout.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn RemoteStore>,
    pub auth: Arc<dyn AuthApi>,
    pub request_timeout: Duration,
}

impl AppContext {
    /// Wrap arbitrary implementations (e.g. the in-memory ones) with the
    /// client-side timeout.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthApi>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store: Arc::new(TimedStore::new(store, request_timeout)),
            auth: Arc::new(TimedAuth::new(auth, request_timeout)),
            request_timeout,
        }
    }

    /// Connect to the hosted project over HTTP. The table client and the
    /// auth client share one connection pool and one access token.
    pub fn connect(config: &AppConfig) -> AppResult<Self> {
        let rest = RestConfig::new(&config.url, &config.anon_key, config.request_timeout);
        let client = reqwest_client(&rest)?;
        let token = AccessToken::default();
        let store = RestStore::with_client(client.clone(), rest.clone(), token.clone());
        let auth = RestAuth::with_client(client, rest, token);
        tracing::info!(url = %config.url, timeout_secs = config.request_timeout.as_secs(), "Remote client configured");
        Ok(Self::new(Arc::new(store), Arc::new(auth), config.request_timeout))
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }
}

fn reqwest_client(rest: &RestConfig) -> AppResult<tymelyne_remote::rest::HttpClient> {
    rest.http_client()
        .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))
}
