//! Application services for TymeLyne.
//!
//! Services read rows through `tymelyne-db` repositories, hand them to the
//! pure derivations in `tymelyne-core`, and return view-models. Every
//! service takes an [`AppContext`] holding the remote store and auth
//! client; [`SessionProvider`](session::SessionProvider) owns the signed-in
//! principal.

pub mod achievements;
pub mod challenges;
pub mod community;
pub mod config;
pub mod context;
pub mod error;
pub mod goals;
pub mod preferences;
pub mod progress;
pub mod scope;
pub mod session;
pub mod streaks;

pub use context::AppContext;
pub use error::{AppError, AppResult};
