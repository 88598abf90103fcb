//! Achievement definitions and unlock rows.

use serde::{Deserialize, Serialize};
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `achievements` table. Used for display only; unlock
/// rules live in the static catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// A row from the `user_achievements` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: DbId,
    pub user_id: UserId,
    pub achievement_code: String,
    pub earned_at: Timestamp,
}

/// DTO for recording an unlock.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserAchievement {
    pub user_id: UserId,
    pub achievement_code: String,
    pub earned_at: Timestamp,
}
