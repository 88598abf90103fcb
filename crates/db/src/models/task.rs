//! Task entity model and DTOs.

use serde::{Deserialize, Serialize};
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `tasks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: DbId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub category: Option<String>,
    /// Weak reference; the goal may have been deleted.
    #[serde(default)]
    pub goal_id: Option<DbId>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// DTO for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
    pub category: Option<String>,
    pub goal_id: Option<DbId>,
    pub completed: bool,
}

/// DTO for updating a task. All fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}
