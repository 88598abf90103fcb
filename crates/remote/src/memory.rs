//! In-process implementations of [`RemoteStore`] and [`AuthApi`].
//!
//! [`MemoryStore`] keeps tables as vectors of JSON objects and enforces the
//! natural keys from [`schema`](crate::schema), so idempotent writes behave
//! as they do against the hosted database. It does not emulate database
//! triggers: counters such as `posts.like_count` only change when a caller
//! writes them. Failures and latency can be injected per table and
//! operation for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::auth::{AuthApi, AuthEvent, AuthEventBus, AuthUser, Session, SignUpOutcome};
use crate::error::ClientError;
use crate::query::{compare, Query};
use crate::schema;
use crate::store::{ConflictResolution, RemoteStore, Upsert};

type Row = Map<String, Value>;

/// Store operation, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Count,
    Insert,
    Upsert,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    table: String,
    op: Op,
    /// `None` fails every call until cleared.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    next_id: i64,
    failures: Vec<InjectedFailure>,
    calls: HashMap<(String, Op), usize>,
    latency: Option<Duration>,
}

/// Tables held in memory behind an async mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn injected_error() -> ClientError {
    ClientError::Api {
        status: 503,
        code: None,
        message: "Injected failure".to_string(),
    }
}

fn as_object(value: Value) -> Result<Row, ClientError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ClientError::Api {
            status: 400,
            code: None,
            message: format!("Expected a JSON object row, got {other}"),
        }),
    }
}

fn now_value() -> Value {
    serde_json::to_value(Utc::now()).unwrap_or(Value::Null)
}

/// Whether `a` and `b` agree on every column of `key` (nulls never match).
fn same_key(a: &Row, b: &Row, key: &[&str]) -> bool {
    key.iter().all(|col| match (a.get(*col), b.get(*col)) {
        (Some(x), Some(y)) if !x.is_null() && !y.is_null() => {
            compare(x, y) == std::cmp::Ordering::Equal
        }
        _ => false,
    })
}

fn project(row: &Row, columns: Option<&str>) -> Value {
    match columns.map(str::trim) {
        None | Some("*") => Value::Object(row.clone()),
        Some(list) => {
            let projected = list
                .split(',')
                .map(str::trim)
                .filter_map(|col| row.get(col).map(|v| (col.to_string(), v.clone())))
                .collect();
            Value::Object(projected)
        }
    }
}

impl State {
    fn table(&mut self, name: &str) -> &mut Vec<Row> {
        self.tables.entry(name.to_string()).or_default()
    }

    fn fill_defaults(&mut self, table: &str, row: &mut Row) {
        let Some(layout) = schema::table(table) else {
            return;
        };
        if layout.auto_id && row.get("id").map_or(true, Value::is_null) {
            self.next_id += 1;
            row.insert("id".to_string(), Value::from(self.next_id));
        }
        for col in layout.default_now {
            if row.get(*col).map_or(true, Value::is_null) {
                row.insert((*col).to_string(), now_value());
            }
        }
    }

    fn unique_keys(table: &str) -> Vec<&'static [&'static str]> {
        let mut keys: Vec<&'static [&'static str]> = vec![&["id"]];
        if let Some(layout) = schema::table(table) {
            keys.extend(layout.unique.iter().copied().filter(|k| *k != ["id"]));
        }
        keys
    }

    fn check_unique(rows: &[Row], row: &Row, table: &str) -> Result<(), ClientError> {
        for key in Self::unique_keys(table) {
            if rows.iter().any(|existing| same_key(existing, row, key)) {
                return Err(ClientError::Conflict(format!(
                    "duplicate key value violates unique constraint on {table} ({})",
                    key.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Record the call and return an injected failure if one is armed.
    fn enter(&mut self, table: &str, op: Op) -> Result<(), ClientError> {
        *self.calls.entry((table.to_string(), op)).or_default() += 1;
        let Some(pos) = self
            .failures
            .iter()
            .position(|f| f.table == table && f.op == op)
        else {
            return Ok(());
        };
        if let Some(remaining) = &mut self.failures[pos].remaining {
            *remaining -= 1;
            if *remaining == 0 {
                self.failures.remove(pos);
            }
        }
        Err(injected_error())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, filling ids and timestamps but skipping
    /// failure injection and call counting.
    pub async fn seed(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, ClientError> {
        let mut state = self.state.lock().await;
        Self::insert_rows(&mut state, table, rows)
    }

    /// Snapshot of a table in insertion order.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Fail every `op` on `table` until [`clear_failures`](Self::clear_failures).
    pub async fn fail_on(&self, table: &str, op: Op) {
        self.arm(table, op, None).await;
    }

    /// Fail the next `times` calls of `op` on `table`.
    pub async fn fail_times(&self, table: &str, op: Op, times: usize) {
        if times > 0 {
            self.arm(table, op, Some(times)).await;
        }
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Delay every call by `latency`, to exercise client-side timeouts.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// How many times `op` was called on `table`.
    pub async fn calls(&self, table: &str, op: Op) -> usize {
        let state = self.state.lock().await;
        state
            .calls
            .get(&(table.to_string(), op))
            .copied()
            .unwrap_or(0)
    }

    // ---- private helpers ----

    async fn arm(&self, table: &str, op: Op, remaining: Option<usize>) {
        self.state.lock().await.failures.push(InjectedFailure {
            table: table.to_string(),
            op,
            remaining,
        });
    }

    async fn begin(&self, table: &str, op: Op) -> Result<tokio::sync::MutexGuard<'_, State>, ClientError> {
        let latency = {
            let mut state = self.state.lock().await;
            state.enter(table, op)?;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.state.lock().await)
    }

    /// Insert all rows or none.
    fn insert_rows(state: &mut State, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, ClientError> {
        let mut staged = state.table(table).clone();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = as_object(row)?;
            state.fill_defaults(table, &mut row);
            State::check_unique(&staged, &row, table)?;
            staged.push(row.clone());
            inserted.push(Value::Object(row));
        }
        *state.table(table) = staged;
        Ok(inserted)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError> {
        let mut state = self.begin(table, Op::Select).await?;
        let mut rows: Vec<Row> = state
            .table(table)
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        query.sort(&mut rows);
        Ok(query
            .paginate(rows)
            .iter()
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn count(&self, table: &str, query: &Query) -> Result<u64, ClientError> {
        let mut state = self.begin(table, Op::Count).await?;
        Ok(state.table(table).iter().filter(|row| query.matches(row)).count() as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, ClientError> {
        let mut state = self.begin(table, Op::Insert).await?;
        Self::insert_rows(&mut state, table, rows)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        upsert: Upsert,
    ) -> Result<Vec<Value>, ClientError> {
        let mut state = self.begin(table, Op::Upsert).await?;
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let row = as_object(row)?;
            let existing = state
                .table(table)
                .iter()
                .position(|existing| same_key(existing, &row, upsert.on_conflict));
            match (existing, upsert.resolution) {
                (Some(_), ConflictResolution::IgnoreDuplicates) => {}
                (Some(pos), ConflictResolution::MergeDuplicates) => {
                    let rows = state.table(table);
                    let mut merged = rows[pos].clone();
                    merged.extend(row);
                    let others: Vec<Row> = rows
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != pos)
                        .map(|(_, r)| r.clone())
                        .collect();
                    State::check_unique(&others, &merged, table)?;
                    rows[pos] = merged.clone();
                    result.push(Value::Object(merged));
                }
                (None, _) => {
                    result.extend(Self::insert_rows(&mut state, table, vec![Value::Object(row)])?);
                }
            }
        }
        Ok(result)
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, ClientError> {
        let patch = as_object(patch)?;
        let mut state = self.begin(table, Op::Update).await?;
        let mut updated = Vec::new();
        for row in state.table(table).iter_mut().filter(|row| query.matches(row)) {
            row.extend(patch.clone());
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError> {
        let mut state = self.begin(table, Op::Delete).await?;
        let (removed, kept): (Vec<Row>, Vec<Row>) = state
            .table(table)
            .drain(..)
            .partition(|row| query.matches(row));
        *state.table(table) = kept;
        Ok(removed.into_iter().map(Value::Object).collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryAuth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

/// Accounts and a single current session held in memory.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
    events: AuthEventBus,
    fail_sign_out: AtomicBool,
    fail_get_user: AtomicBool,
    fail_get_session: AtomicBool,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account without signing in.
    pub async fn register(&self, email: &str, password: &str, metadata: Value) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: metadata,
        };
        self.accounts.lock().await.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    /// Replace the current session without emitting an event, as if it
    /// had been restored from storage.
    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.lock().await = session;
    }

    pub fn session_for(user: &AuthUser) -> Session {
        Session {
            access_token: format!("mem-{}", Uuid::new_v4()),
            refresh_token: None,
            expires_at: None,
            user: user.clone(),
        }
    }

    /// Push an event to subscribers, as the hosted service would.
    pub fn emit(&self, event: AuthEvent) {
        self.events.publish(event);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_get_user(&self, fail: bool) {
        self.fail_get_user.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_get_session(&self, fail: bool) {
        self.fail_get_session.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthApi for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let account = self.accounts.lock().await.get(&email.to_lowercase()).cloned();
        let account = account
            .filter(|a| a.password == password)
            .ok_or_else(|| ClientError::Auth("Invalid login credentials".to_string()))?;
        let session = Self::session_for(&account.user);
        *self.session.lock().await = Some(session.clone());
        self.events.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, ClientError> {
        if self.accounts.lock().await.contains_key(&email.to_lowercase()) {
            return Err(ClientError::Auth("User already registered".to_string()));
        }
        let user = self.register(email, password, metadata).await;
        let session = Self::session_for(&user);
        *self.session.lock().await = Some(session.clone());
        self.events.publish(AuthEvent::SignedIn(session.clone()));
        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        self.session.lock().await.take();
        self.events.publish(AuthEvent::SignedOut);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(injected_error());
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, ClientError> {
        if self.fail_get_session.load(Ordering::SeqCst) {
            return Err(injected_error());
        }
        Ok(self.session.lock().await.clone())
    }

    async fn get_user(&self) -> Result<AuthUser, ClientError> {
        if self.fail_get_user.load(Ordering::SeqCst) {
            return Err(injected_error());
        }
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or(ClientError::NotAuthenticated)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::schema::{GOALS, POST_LIKES, PROFILES, USER_ACHIEVEMENTS};

    #[tokio::test]
    async fn insert_assigns_ids_and_timestamps() {
        let store = MemoryStore::new();
        let rows = store
            .insert(GOALS, vec![json!({"title": "a"}), json!({"title": "b"})])
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[1]["id"], 2);
        assert!(rows[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn insert_rejects_natural_key_duplicates_atomically() {
        let store = MemoryStore::new();
        let row = json!({"post_id": 1, "user_id": "u"});
        store.insert(POST_LIKES, vec![row.clone()]).await.unwrap();
        let err = store
            .insert(POST_LIKES, vec![json!({"post_id": 2, "user_id": "u"}), row])
            .await
            .unwrap_err();
        assert_matches!(err, ClientError::Conflict(_));
        assert_eq!(store.rows(POST_LIKES).await.len(), 1);
    }

    #[tokio::test]
    async fn upsert_ignore_returns_nothing_for_existing() {
        let store = MemoryStore::new();
        let upsert = Upsert::ignore(&["user_id", "achievement_code"]);
        let row = json!({"user_id": "u", "achievement_code": "first_goal"});
        let first = store.upsert(USER_ACHIEVEMENTS, vec![row.clone()], upsert).await.unwrap();
        let second = store.upsert(USER_ACHIEVEMENTS, vec![row], upsert).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(store.rows(USER_ACHIEVEMENTS).await.len(), 1);
    }

    #[tokio::test]
    async fn upsert_merge_overwrites_columns() {
        let store = MemoryStore::new();
        let upsert = Upsert::merge(&["user_id", "streak_type"]);
        store
            .upsert("user_streaks", vec![json!({"user_id": "u", "streak_type": "daily_login", "current_count": 1})], upsert)
            .await
            .unwrap();
        let rows = store
            .upsert("user_streaks", vec![json!({"user_id": "u", "streak_type": "daily_login", "current_count": 2})], upsert)
            .await
            .unwrap();
        assert_eq!(rows[0]["current_count"], 2);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(store.rows("user_streaks").await.len(), 1);
    }

    #[tokio::test]
    async fn upsert_merge_keeps_other_keys_unique() {
        let store = MemoryStore::new();
        store
            .seed(
                PROFILES,
                vec![
                    json!({"id": "a", "username": "alex"}),
                    json!({"id": "b", "username": "sam"}),
                ],
            )
            .await
            .unwrap();

        let err = store
            .upsert(PROFILES, vec![json!({"id": "b", "username": "alex"})], Upsert::merge(&["id"]))
            .await
            .unwrap_err();
        assert_matches!(err, ClientError::Conflict(_));
        assert_eq!(store.rows(PROFILES).await[1]["username"], "sam");
    }

    #[tokio::test]
    async fn select_filters_sorts_pages_and_projects() {
        let store = MemoryStore::new();
        for n in 0..7 {
            store
                .seed(GOALS, vec![json!({"title": format!("g{n}"), "user_id": if n % 2 == 0 { "a" } else { "b" }})])
                .await
                .unwrap();
        }
        let query = Query::new()
            .columns("id, title")
            .eq("user_id", "a")
            .order_desc("id")
            .range(1, 2);
        let rows = store.select(GOALS, &query).await.unwrap();
        assert_eq!(rows, vec![json!({"id": 5, "title": "g4"}), json!({"id": 3, "title": "g2"})]);
        assert_eq!(store.count(GOALS, &Query::new().eq("user_id", "a")).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn update_and_delete_return_affected_rows() {
        let store = MemoryStore::new();
        store.seed(GOALS, vec![json!({"title": "a"}), json!({"title": "b"})]).await.unwrap();
        let updated = store
            .update(GOALS, json!({"completed": true}), &Query::new().eq("id", 2))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["completed"], true);

        let removed = store.delete(GOALS, &Query::new().eq("id", 1)).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.rows(GOALS).await.len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_scoped_and_counted() {
        let store = MemoryStore::new();
        store.fail_times(GOALS, Op::Select, 1).await;
        assert!(store.select(GOALS, &Query::new()).await.is_err());
        assert!(store.select(GOALS, &Query::new()).await.is_ok());
        assert!(store.select("tasks", &Query::new()).await.is_ok());
        assert_eq!(store.calls(GOALS, Op::Select).await, 2);

        store.fail_on(GOALS, Op::Insert).await;
        assert!(store.insert(GOALS, vec![json!({})]).await.is_err());
        assert!(store.insert(GOALS, vec![json!({})]).await.is_err());
        store.clear_failures().await;
        assert!(store.insert(GOALS, vec![json!({})]).await.is_ok());
    }

    #[tokio::test]
    async fn auth_sign_in_checks_password() {
        let auth = MemoryAuth::new();
        let user = auth.register("a@b.co", "secret1", json!({})).await;
        assert_matches!(auth.sign_in("a@b.co", "wrong").await, Err(ClientError::Auth(_)));

        let mut rx = auth.subscribe();
        let session = auth.sign_in("A@B.co", "secret1").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_matches!(rx.recv().await.unwrap(), AuthEvent::SignedIn(_));
        assert_eq!(auth.get_user().await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn auth_sign_out_clears_even_when_failing() {
        let auth = MemoryAuth::new();
        auth.register("a@b.co", "secret1", json!({})).await;
        auth.sign_in("a@b.co", "secret1").await.unwrap();
        auth.set_fail_sign_out(true);
        assert!(auth.sign_out().await.is_err());
        assert_eq!(auth.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn auth_sign_up_rejects_existing_email() {
        let auth = MemoryAuth::new();
        auth.sign_up("a@b.co", "secret1", json!({"username": "a"})).await.unwrap();
        assert_matches!(
            auth.sign_up("a@b.co", "secret1", json!({})).await,
            Err(ClientError::Auth(_))
        );
    }
}
