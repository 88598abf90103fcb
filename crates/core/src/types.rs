/// Row primary keys are BIGSERIAL in the hosted store.
pub type DbId = i64;

/// Principals are identified by the auth service's UUID.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
