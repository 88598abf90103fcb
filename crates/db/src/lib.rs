//! Typed rows and repositories for the hosted TymeLyne tables.
//!
//! Models mirror table rows; repositories are zero-sized structs whose
//! async methods take `&dyn RemoteStore` as the first argument.

pub mod models;
pub mod repositories;

pub use tymelyne_remote::{ClientError as DbError, RemoteStore};
