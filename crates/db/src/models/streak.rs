//! Streak rows: one per principal and streak type.

use serde::{Deserialize, Serialize};
use tymelyne_core::streaks::StreakSnapshot;
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `user_streaks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStreak {
    pub id: DbId,
    pub user_id: UserId,
    pub streak_type: String,
    #[serde(default)]
    pub current_count: i32,
    #[serde(default)]
    pub longest_count: i32,
    pub last_updated_at: Timestamp,
}

impl UserStreak {
    pub fn snapshot(&self) -> StreakSnapshot {
        StreakSnapshot {
            current: self.current_count,
            longest: self.longest_count,
            last_updated_at: self.last_updated_at,
        }
    }
}

/// DTO for the streak upsert.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertStreak {
    pub user_id: UserId,
    pub streak_type: String,
    pub current_count: i32,
    pub longest_count: i32,
    pub last_updated_at: Timestamp,
}
