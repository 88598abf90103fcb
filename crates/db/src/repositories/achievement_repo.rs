//! Repository for the `achievements` and `user_achievements` tables.

use tymelyne_core::types::{Timestamp, UserId};
use tymelyne_remote::schema::{ACHIEVEMENTS, USER_ACHIEVEMENTS};
use tymelyne_remote::store::{fetch_all, upsert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore, Upsert};

use crate::models::achievement::{
    AchievementDefinition, CreateUserAchievement, UserAchievement,
};

/// Conflict target for unlock rows.
const UNLOCK_KEY: &[&str] = &["user_id", "achievement_code"];

pub struct AchievementRepo;

impl AchievementRepo {
    /// Remote definitions for the given codes in one round-trip.
    pub async fn definitions_for(
        store: &dyn RemoteStore,
        codes: &[String],
    ) -> Result<Vec<AchievementDefinition>, ClientError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new().is_in("code", codes.iter());
        fetch_all(store, ACHIEVEMENTS, &query).await
    }

    /// Unlocks of a user, oldest first.
    pub async fn list_unlocked(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Vec<UserAchievement>, ClientError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_asc("earned_at")
            .order_asc("id");
        fetch_all(store, USER_ACHIEVEMENTS, &query).await
    }

    pub async fn count_unlocked(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<u64, ClientError> {
        store
            .count(USER_ACHIEVEMENTS, &Query::new().eq("user_id", user_id))
            .await
    }

    /// Record an unlock idempotently.
    ///
    /// Returns `None` when the user already holds the achievement, whether
    /// from an earlier evaluation or a concurrent one.
    pub async fn unlock(
        store: &dyn RemoteStore,
        user_id: UserId,
        code: &str,
        earned_at: Timestamp,
    ) -> Result<Option<UserAchievement>, ClientError> {
        let input = CreateUserAchievement {
            user_id,
            achievement_code: code.to_string(),
            earned_at,
        };
        upsert_one(store, USER_ACHIEVEMENTS, &input, Upsert::ignore(UNLOCK_KEY)).await
    }
}
