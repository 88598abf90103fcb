//! Progress derivation: completion percentages and the progress view-model.
//!
//! Callers reduce goal and task rows to counts before calling in, so the
//! derivation never depends on the row types of the data layer.

use serde::Serialize;

use crate::goals::effective_goal_progress;
use crate::leveling::{compute_level, LevelInfo};

/// Counts and totals needed to derive a progress view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressInput {
    pub total_xp: i64,
    pub goals_total: usize,
    pub goals_completed: usize,
    pub tasks_total: usize,
    pub tasks_completed: usize,
}

impl ProgressInput {
    /// Build an input from goal and task completion flags.
    pub fn from_rows<G, T>(total_xp: i64, goals: G, tasks: T) -> Self
    where
        G: IntoIterator<Item = bool>,
        T: IntoIterator<Item = bool>,
    {
        let (goals_total, goals_completed) = tally(goals);
        let (tasks_total, tasks_completed) = tally(tasks);
        Self {
            total_xp,
            goals_total,
            goals_completed,
            tasks_total,
            tasks_completed,
        }
    }
}

/// Derived progress view-model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressView {
    pub level: i32,
    pub current_xp: i64,
    pub next_level_xp: i64,
    pub remaining_xp: i64,
    pub level_title: &'static str,
    pub level_progress_pct: u8,
    pub task_completion_pct: u8,
    pub goal_completion_pct: u8,
}

/// `round(100 * completed / total)`, or 0 when `total` is 0.
pub fn completion_pct(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round() as u64;
    pct.min(100) as u8
}

/// Derive the progress view-model from counts.
pub fn derive_progress(input: &ProgressInput) -> ProgressView {
    let info: LevelInfo = compute_level(input.total_xp);
    ProgressView {
        level: info.level,
        current_xp: info.current_xp,
        next_level_xp: info.next_level_xp,
        remaining_xp: info.remaining_xp,
        level_title: info.title(),
        level_progress_pct: info.level_progress_pct(),
        task_completion_pct: completion_pct(input.tasks_completed, input.tasks_total),
        goal_completion_pct: completion_pct(input.goals_completed, input.goals_total),
    }
}

/// Mean displayed progress over `(progress, completed)` goal pairs.
///
/// Completed goals count as 100. Returns 0 for an empty list.
pub fn average_goal_progress<I>(goals: I) -> u8
where
    I: IntoIterator<Item = (i32, bool)>,
{
    let mut sum = 0u64;
    let mut count = 0u64;
    for (progress, completed) in goals {
        sum += effective_goal_progress(progress, completed) as u64;
        count += 1;
    }
    if count == 0 {
        return 0;
    }
    ((sum as f64 / count as f64).round() as u64).min(100) as u8
}

fn tally<I: IntoIterator<Item = bool>>(flags: I) -> (usize, usize) {
    flags
        .into_iter()
        .fold((0, 0), |(total, done), flag| (total + 1, done + usize::from(flag)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
