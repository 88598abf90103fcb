//! Goal entity model and DTOs.

use serde::{Deserialize, Serialize};
use tymelyne_core::goals::effective_goal_progress;
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `goals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: DbId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored percentage in 0..=100. See [`Goal::display_progress`].
    #[serde(default)]
    pub progress: i32,
    #[serde(default)]
    pub deadline: Option<Timestamp>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Goal {
    /// Progress as shown to the user: completed goals read 100.
    pub fn display_progress(&self) -> u8 {
        effective_goal_progress(self.progress, self.completed)
    }
}

/// DTO for creating a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGoal {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub progress: i32,
    pub deadline: Option<Timestamp>,
    pub completed: bool,
}

/// DTO for updating a goal. All fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGoal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}
