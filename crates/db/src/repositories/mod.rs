//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&dyn RemoteStore` as the first argument. Single-row
//! lookups return `Option`; "no rows" is never an error here.

pub mod achievement_repo;
pub mod challenge_repo;
pub mod comment_repo;
pub mod goal_repo;
pub mod like_repo;
pub mod post_repo;
pub mod preference_repo;
pub mod profile_repo;
pub mod streak_repo;
pub mod task_repo;

pub use achievement_repo::AchievementRepo;
pub use challenge_repo::{ChallengeRepo, ParticipationRepo};
pub use comment_repo::CommentRepo;
pub use goal_repo::GoalRepo;
pub use like_repo::LikeRepo;
pub use post_repo::PostRepo;
pub use preference_repo::PreferenceRepo;
pub use profile_repo::ProfileRepo;
pub use streak_repo::StreakRepo;
pub use task_repo::TaskRepo;

use serde::Deserialize;

/// Projection used when only completion flags are needed.
#[derive(Deserialize)]
pub(crate) struct CompletedFlag {
    #[serde(default)]
    pub completed: bool,
}

/// Serialize a patch and stamp `updated_at`.
pub(crate) fn stamped_patch<B: serde::Serialize>(
    patch: &B,
    now: tymelyne_core::types::Timestamp,
) -> Result<serde_json::Value, tymelyne_remote::ClientError> {
    let mut value = serde_json::to_value(patch)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("updated_at".to_string(), serde_json::to_value(now)?);
    }
    Ok(value)
}
