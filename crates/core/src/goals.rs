//! Goal and task rules: progress normalization, input validation, filters.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Goal progress is a percentage.
pub const MIN_GOAL_PROGRESS: i32 = 0;
pub const MAX_GOAL_PROGRESS: i32 = 100;

/// Maximum length of a goal or task title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Progress shown for a goal. A completed goal always reads as 100,
/// whatever the stored value says.
pub fn effective_goal_progress(progress: i32, completed: bool) -> u8 {
    if completed {
        return MAX_GOAL_PROGRESS as u8;
    }
    clamp_goal_progress(progress) as u8
}

/// Clamp a progress value into `0..=100`.
pub fn clamp_goal_progress(progress: i32) -> i32 {
    progress.clamp(MIN_GOAL_PROGRESS, MAX_GOAL_PROGRESS)
}

/// The `(progress, completed)` pair to store after a progress update.
///
/// Reaching 100 marks the goal completed; dropping below 100 reopens it.
pub fn progress_update(progress: i32) -> (i32, bool) {
    let progress = clamp_goal_progress(progress);
    (progress, progress == MAX_GOAL_PROGRESS)
}

/// Validate a goal or task title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a goal progress value supplied on create.
pub fn validate_goal_progress(progress: i32) -> Result<(), CoreError> {
    if !(MIN_GOAL_PROGRESS..=MAX_GOAL_PROGRESS).contains(&progress) {
        return Err(CoreError::Validation(format!(
            "Progress must be between {MIN_GOAL_PROGRESS} and {MAX_GOAL_PROGRESS}, got {progress}"
        )));
    }
    Ok(())
}

/// Which tasks to show in a task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl TaskFilter {
    /// Value of the `completed` column to filter on, if any.
    pub fn completed(&self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Completed => Some(true),
            Self::Pending => Some(false),
        }
    }
}
