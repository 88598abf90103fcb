//! Remote data client for the hosted TymeLyne backend.
//!
//! Two seams, both object-safe so services can hold `Arc<dyn ...>`:
//!
//! - [`RemoteStore`]: table reads and writes (select, count, insert,
//!   upsert, update, delete) driven by a [`Query`].
//! - [`AuthApi`]: sign-in, sign-up, sign-out, session lookup, and a
//!   broadcast of [`AuthEvent`]s.
//!
//! [`rest`] and [`rest_auth`] speak the PostgREST / GoTrue HTTP conventions
//! over `reqwest`; [`memory`] implements both seams in-process for tests
//! and offline use. [`timeout`] bounds every call with a client-side
//! deadline.

pub mod auth;
pub mod error;
pub mod memory;
pub mod query;
pub mod rest;
pub mod rest_auth;
pub mod schema;
pub mod store;
pub mod timeout;

pub use auth::{AuthApi, AuthEvent, AuthEventBus, AuthUser, Session, SignUpOutcome};
pub use error::ClientError;
pub use query::{Filter, Order, Query};
pub use store::{ConflictResolution, RemoteStore, Upsert};
pub use timeout::{with_timeout, TimedAuth, TimedStore};
