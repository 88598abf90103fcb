//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `Deserialize` entity struct matching the table row
//! - A `Serialize` create DTO for inserts
//! - A `Serialize` update DTO (all `Option` fields, absent ones omitted)
//!   for patches

pub mod achievement;
pub mod challenge;
pub mod comment;
pub mod goal;
pub mod post;
pub mod preference;
pub mod profile;
pub mod streak;
pub mod task;
