//! The table-access seam and typed helpers over it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::query::Query;

/// How an upsert treats a row whose conflict key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Keep the existing row; the returned set omits it.
    IgnoreDuplicates,
    /// Overwrite the existing row with the supplied columns.
    MergeDuplicates,
}

impl ConflictResolution {
    /// PostgREST `Prefer: resolution=` value.
    pub fn as_prefer(self) -> &'static str {
        match self {
            Self::IgnoreDuplicates => "ignore-duplicates",
            Self::MergeDuplicates => "merge-duplicates",
        }
    }
}

/// Conflict target and resolution for an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upsert {
    pub on_conflict: &'static [&'static str],
    pub resolution: ConflictResolution,
}

impl Upsert {
    pub fn ignore(on_conflict: &'static [&'static str]) -> Self {
        Self {
            on_conflict,
            resolution: ConflictResolution::IgnoreDuplicates,
        }
    }

    pub fn merge(on_conflict: &'static [&'static str]) -> Self {
        Self {
            on_conflict,
            resolution: ConflictResolution::MergeDuplicates,
        }
    }
}

/// Row-level access to the hosted tables.
///
/// Rows travel as JSON objects. Every write returns the affected rows as
/// stored (server defaults and generated ids filled in).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError>;

    /// Number of rows matching the query's filters. Range and ordering are
    /// ignored.
    async fn count(&self, table: &str, query: &Query) -> Result<u64, ClientError>;

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, ClientError>;

    /// Insert rows, resolving natural-key conflicts per `upsert`.
    ///
    /// With [`ConflictResolution::IgnoreDuplicates`], rows that already
    /// existed are absent from the result.
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        upsert: Upsert,
    ) -> Result<Vec<Value>, ClientError>;

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, ClientError>;

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>, ClientError>;
}

// ---------------------------------------------------------------------------
// Typed helpers
// ---------------------------------------------------------------------------

/// Decode JSON rows into `T`.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, ClientError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClientError::from))
        .collect()
}

fn encode<B: Serialize>(body: &B) -> Result<Value, ClientError> {
    Ok(serde_json::to_value(body)?)
}

pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, ClientError> {
    decode_rows(store.select(table, query).await?)
}

/// First matching row, or `None`. "No rows" is not an error here.
pub async fn fetch_optional<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    table: &str,
    query: &Query,
) -> Result<Option<T>, ClientError> {
    let query = query.clone().limit(1);
    match store.select(table, &query).await {
        Ok(rows) => Ok(decode_rows(rows)?.into_iter().next()),
        Err(ClientError::NoRows) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Insert one row and return it as stored.
pub async fn insert_one<T: DeserializeOwned, B: Serialize>(
    store: &dyn RemoteStore,
    table: &str,
    body: &B,
) -> Result<T, ClientError> {
    let rows = store.insert(table, vec![encode(body)?]).await?;
    decode_rows(rows)?.into_iter().next().ok_or(ClientError::NoRows)
}

/// Upsert one row. `None` means the row already existed and was ignored.
pub async fn upsert_one<T: DeserializeOwned, B: Serialize>(
    store: &dyn RemoteStore,
    table: &str,
    body: &B,
    upsert: Upsert,
) -> Result<Option<T>, ClientError> {
    let rows = store.upsert(table, vec![encode(body)?], upsert).await?;
    Ok(decode_rows(rows)?.into_iter().next())
}

/// Apply a patch to matching rows and return them as stored.
pub async fn update_rows<T: DeserializeOwned, B: Serialize>(
    store: &dyn RemoteStore,
    table: &str,
    patch: &B,
    query: &Query,
) -> Result<Vec<T>, ClientError> {
    decode_rows(store.update(table, encode(patch)?, query).await?)
}

/// Patch exactly one row; an empty result means it does not exist.
pub async fn update_one<T: DeserializeOwned, B: Serialize>(
    store: &dyn RemoteStore,
    table: &str,
    patch: &B,
    query: &Query,
) -> Result<Option<T>, ClientError> {
    Ok(update_rows(store, table, patch, query).await?.into_iter().next())
}

/// Delete matching rows and report how many went away.
pub async fn delete_rows(
    store: &dyn RemoteStore,
    table: &str,
    query: &Query,
) -> Result<usize, ClientError> {
    Ok(store.delete(table, query).await?.len())
}
