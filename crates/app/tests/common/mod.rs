//! Shared fixtures: services wired to the in-memory store and auth.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tymelyne_app::AppContext;
use tymelyne_remote::memory::{MemoryAuth, MemoryStore};
use tymelyne_remote::schema::PROFILES;
use tymelyne_remote::AuthUser;
use uuid::Uuid;

pub const EMAIL: &str = "alex@example.com";
pub const PASSWORD: &str = "secret123";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuth>,
    pub ctx: AppContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(MemoryAuth::new());
        let ctx = AppContext::new(store.clone(), auth.clone(), timeout);
        Self { store, auth, ctx }
    }

    /// Register the default account without signing in.
    pub async fn register(&self) -> AuthUser {
        self.auth
            .register(EMAIL, PASSWORD, json!({ "username": "alex" }))
            .await
    }

    /// Register the default account, seed its profile, and store a
    /// session for it as if restored from disk.
    pub async fn signed_in(&self) -> Uuid {
        let user = self.register().await;
        self.seed_profile(user.id, "Alex", "Chen", 0).await;
        self.auth
            .set_session(Some(MemoryAuth::session_for(&user)))
            .await;
        user.id
    }

    pub async fn seed_profile(&self, id: Uuid, first: &str, last: &str, xp: i64) {
        self.store
            .seed(
                PROFILES,
                vec![json!({
                    "id": id,
                    "first_name": first,
                    "last_name": last,
                    "username": format!("{}_{}", first.to_lowercase(), &id.simple().to_string()[..6]),
                    "experience_points": xp,
                    "level": 1,
                })],
            )
            .await
            .unwrap();
    }
}
