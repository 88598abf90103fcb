//! Challenge status, button labels, and progress rules.
//!
//! A challenge window is half-open: it is in progress from `start_date`
//! up to but excluding `end_date`. At the end instant it is completed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const GOAL_TYPE_HABIT: &str = "habit";
pub const GOAL_TYPE_GOAL: &str = "goal";
pub const GOAL_TYPE_PROGRESS: &str = "progress";

pub const VALID_GOAL_TYPES: &[&str] = &[GOAL_TYPE_HABIT, GOAL_TYPE_GOAL, GOAL_TYPE_PROGRESS];

/// Where `now` falls relative to a challenge window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    StartingSoon,
    InProgress,
    Completed,
}

impl ChallengeStatus {
    /// Derive the status at `now`.
    pub fn at(start: Timestamp, end: Timestamp, now: Timestamp) -> Self {
        if now < start {
            Self::StartingSoon
        } else if now < end {
            Self::InProgress
        } else {
            Self::Completed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StartingSoon => "Starting Soon",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Action button label for a viewer with the given join state.
    pub fn action_label(&self, joined: bool) -> &'static str {
        match (self, joined) {
            (Self::StartingSoon, false) => "Join Challenge",
            (Self::StartingSoon, true) => "Leave Challenge",
            (Self::InProgress, false) => "Join Now",
            (Self::InProgress, true) => "View Progress",
            (Self::Completed, false) => "See Results",
            (Self::Completed, true) => "View Results",
        }
    }
}

/// Kind of target a challenge counts toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeGoalType {
    Habit,
    Goal,
    Progress,
}

impl ChallengeGoalType {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            GOAL_TYPE_HABIT => Ok(Self::Habit),
            GOAL_TYPE_GOAL => Ok(Self::Goal),
            GOAL_TYPE_PROGRESS => Ok(Self::Progress),
            _ => Err(CoreError::Validation(format!(
                "Invalid challenge goal type '{s}'. Must be one of: {}",
                VALID_GOAL_TYPES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Habit => GOAL_TYPE_HABIT,
            Self::Goal => GOAL_TYPE_GOAL,
            Self::Progress => GOAL_TYPE_PROGRESS,
        }
    }
}

/// Clamp a participant's progress into `[0, target_count]`.
///
/// A non-positive target clamps everything to 0.
pub fn clamp_progress(value: i32, target_count: i32) -> i32 {
    value.clamp(0, target_count.max(0))
}

/// `round(100 * progress / target_count)`, capped at 100; 0 when the
/// target is not positive.
pub fn progress_pct(progress: i32, target_count: i32) -> u8 {
    if target_count <= 0 {
        return 0;
    }
    crate::progress::completion_pct(progress.max(0) as usize, target_count as usize)
}

/// Whole days left until `end`, never negative. Partial days round up.
pub fn days_left(end: Timestamp, now: Timestamp) -> i64 {
    let seconds = (end - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    (seconds + 86_399) / 86_400
}

/// Validate a challenge window and target before creating it.
pub fn validate_challenge(start: Timestamp, end: Timestamp, target_count: i32) -> Result<(), CoreError> {
    if end <= start {
        return Err(CoreError::Validation(
            "Challenge end date must be after its start date".to_string(),
        ));
    }
    if target_count <= 0 {
        return Err(CoreError::Validation(
            "Challenge target count must be positive".to_string(),
        ));
    }
    Ok(())
}
