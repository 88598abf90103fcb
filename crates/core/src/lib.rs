//! Pure domain logic for TymeLyne.
//!
//! Nothing in this crate performs I/O. Callers load rows from the remote
//! store and pass plain values in; every function here is deterministic
//! given its inputs (the current time is always a parameter).

pub mod account;
pub mod achievements;
pub mod challenges;
pub mod community;
pub mod error;
pub mod goals;
pub mod leveling;
pub mod preferences;
pub mod progress;
pub mod quotes;
pub mod streaks;
pub mod types;
