//! Progress and dashboard view-models.

use serde::Serialize;
use tymelyne_core::progress::{average_goal_progress, derive_progress, ProgressInput, ProgressView};
use tymelyne_core::quotes::quote_for;
use tymelyne_core::types::{Timestamp, UserId};
use tymelyne_db::repositories::{AchievementRepo, GoalRepo, ProfileRepo, TaskRepo};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::streaks::{self, StreakView};

/// A loaded view, or the reason it could not be loaded. A failed load is
/// never shown as zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState<T> {
    Ready(T),
    Unavailable { message: String, retryable: bool },
}

impl<T> ViewState<T> {
    pub fn from_result(result: AppResult<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => {
                tracing::warn!(error = %e, "View unavailable");
                Self::Unavailable {
                    message: e.user_message(),
                    retryable: e.is_retryable(),
                }
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Derive the progress view from the user's XP, goals, and tasks.
pub async fn fetch_progress(ctx: &AppContext, user_id: UserId) -> AppResult<ProgressView> {
    let store = ctx.store();
    let (profile, goals, tasks) = tokio::try_join!(
        ProfileRepo::find_by_id(store, user_id),
        GoalRepo::completion_flags(store, user_id),
        TaskRepo::completion_flags(store, user_id),
    )
    .map_err(AppError::fetch("your progress"))?;

    let total_xp = profile.map_or(0, |p| p.experience_points);
    Ok(derive_progress(&ProgressInput::from_rows(total_xp, goals, tasks)))
}

pub async fn load_progress(ctx: &AppContext, user_id: UserId) -> ViewState<ProgressView> {
    ViewState::from_result(fetch_progress(ctx, user_id).await)
}

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub progress: ProgressView,
    pub goals_in_progress: usize,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    /// Mean displayed progress over all goals.
    pub overall_progress_pct: u8,
    pub achievements_earned: u64,
    pub streaks: Vec<StreakView>,
    pub quote: &'static str,
}

pub async fn fetch_dashboard(
    ctx: &AppContext,
    user_id: UserId,
    now: Timestamp,
) -> AppResult<DashboardOverview> {
    let store = ctx.store();
    let (profile, goals, task_flags, achievements_earned) = tokio::try_join!(
        ProfileRepo::find_by_id(store, user_id),
        GoalRepo::list_for_user(store, user_id),
        TaskRepo::completion_flags(store, user_id),
        AchievementRepo::count_unlocked(store, user_id),
    )
    .map_err(AppError::fetch("your dashboard"))?;
    let streaks = streaks::list_streaks(ctx, user_id, now).await?;

    let total_xp = profile.map_or(0, |p| p.experience_points);
    let input = ProgressInput::from_rows(
        total_xp,
        goals.iter().map(|g| g.completed),
        task_flags.iter().copied(),
    );

    Ok(DashboardOverview {
        progress: derive_progress(&input),
        goals_in_progress: input.goals_total - input.goals_completed,
        tasks_completed: input.tasks_completed,
        tasks_total: input.tasks_total,
        overall_progress_pct: average_goal_progress(goals.iter().map(|g| (g.progress, g.completed))),
        achievements_earned,
        streaks,
        quote: quote_for(now.date_naive()),
    })
}

pub async fn load_dashboard(
    ctx: &AppContext,
    user_id: UserId,
    now: Timestamp,
) -> ViewState<DashboardOverview> {
    ViewState::from_result(fetch_dashboard(ctx, user_id, now).await)
}
