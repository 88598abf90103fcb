//! Goal and task services.
//!
//! Mutations that count toward streaks or achievements record them after
//! the primary write. Those follow-ups are logged on failure and never
//! fail the mutation itself.

use chrono::Utc;
use serde::Serialize;
use tymelyne_core::goals::{progress_update, validate_goal_progress, validate_title, TaskFilter, MAX_GOAL_PROGRESS};
use tymelyne_core::streaks::StreakType;
use tymelyne_core::types::{DbId, Timestamp, UserId};
use tymelyne_db::models::goal::{CreateGoal, Goal, UpdateGoal};
use tymelyne_db::models::task::{CreateTask, Task, UpdateTask};
use tymelyne_db::repositories::{GoalRepo, TaskRepo};

use crate::achievements;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::streaks;

/// A written row plus any achievements it unlocked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mutated<T> {
    pub row: T,
    pub unlocked: Vec<String>,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// Goals as shown in lists: stored row plus displayed progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub display_progress: u8,
}

impl From<Goal> for GoalView {
    fn from(goal: Goal) -> Self {
        Self {
            display_progress: goal.display_progress(),
            goal,
        }
    }
}

pub async fn list_goals(ctx: &AppContext, user_id: UserId) -> AppResult<Vec<GoalView>> {
    let goals = GoalRepo::list_for_user(ctx.store(), user_id)
        .await
        .map_err(AppError::fetch("goals"))?;
    Ok(goals.into_iter().map(GoalView::from).collect())
}

#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub progress: i32,
    pub deadline: Option<Timestamp>,
}

pub async fn create_goal(
    ctx: &AppContext,
    user_id: UserId,
    input: NewGoal,
) -> AppResult<Mutated<Goal>> {
    validate_title(&input.title)?;
    validate_goal_progress(input.progress)?;
    let (progress, completed) = progress_update(input.progress);
    let row = CreateGoal {
        user_id,
        title: input.title.trim().to_string(),
        description: trimmed(input.description),
        progress,
        deadline: input.deadline,
        completed,
    };
    let goal = GoalRepo::create(ctx.store(), &row)
        .await
        .map_err(AppError::mutation("create the goal"))?;
    tracing::info!(user_id = %user_id, goal_id = goal.id, "Goal created");

    let unlocked = achievements::evaluate_quietly(ctx, user_id).await;
    Ok(Mutated { row: goal, unlocked })
}

/// Set a goal's progress. Reaching 100 completes the goal and anything
/// lower reopens it.
pub async fn set_goal_progress(
    ctx: &AppContext,
    user_id: UserId,
    goal_id: DbId,
    progress: i32,
) -> AppResult<Mutated<Goal>> {
    let (progress, completed) = progress_update(progress);
    let patch = UpdateGoal {
        progress: Some(progress),
        completed: Some(completed),
        ..UpdateGoal::default()
    };
    let goal = GoalRepo::update(ctx.store(), user_id, goal_id, &patch)
        .await
        .map_err(AppError::mutation("update the goal"))?
        .ok_or_else(|| AppError::not_found("goal", goal_id))?;
    tracing::info!(user_id = %user_id, goal_id, progress, completed, "Goal progress updated");

    streaks::record_quietly(ctx, user_id, StreakType::GoalProgress, Utc::now()).await;
    let unlocked = achievements::evaluate_quietly(ctx, user_id).await;
    Ok(Mutated { row: goal, unlocked })
}

pub async fn complete_goal(
    ctx: &AppContext,
    user_id: UserId,
    goal_id: DbId,
) -> AppResult<Mutated<Goal>> {
    set_goal_progress(ctx, user_id, goal_id, MAX_GOAL_PROGRESS).await
}

pub async fn delete_goal(ctx: &AppContext, user_id: UserId, goal_id: DbId) -> AppResult<()> {
    let deleted = GoalRepo::delete(ctx.store(), user_id, goal_id)
        .await
        .map_err(AppError::mutation("delete the goal"))?;
    if !deleted {
        return Err(AppError::not_found("goal", goal_id));
    }
    tracing::info!(user_id = %user_id, goal_id, "Goal deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub async fn list_tasks(
    ctx: &AppContext,
    user_id: UserId,
    filter: TaskFilter,
    category: Option<&str>,
) -> AppResult<Vec<Task>> {
    TaskRepo::list_for_user(ctx.store(), user_id, filter, category)
        .await
        .map_err(AppError::fetch("tasks"))
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
    pub category: Option<String>,
    pub goal_id: Option<DbId>,
}

pub async fn create_task(
    ctx: &AppContext,
    user_id: UserId,
    input: NewTask,
) -> AppResult<Mutated<Task>> {
    validate_title(&input.title)?;
    let row = CreateTask {
        user_id,
        title: input.title.trim().to_string(),
        description: trimmed(input.description),
        due_date: input.due_date,
        category: trimmed(input.category),
        goal_id: input.goal_id,
        completed: false,
    };
    let task = TaskRepo::create(ctx.store(), &row)
        .await
        .map_err(AppError::mutation("create the task"))?;
    tracing::info!(user_id = %user_id, task_id = task.id, "Task created");

    let unlocked = achievements::evaluate_quietly(ctx, user_id).await;
    Ok(Mutated { row: task, unlocked })
}

/// Mark a task done or not done. Completing records the task streak.
pub async fn set_task_completed(
    ctx: &AppContext,
    user_id: UserId,
    task_id: DbId,
    completed: bool,
) -> AppResult<Mutated<Task>> {
    let patch = UpdateTask {
        completed: Some(completed),
        ..UpdateTask::default()
    };
    let task = TaskRepo::update(ctx.store(), user_id, task_id, &patch)
        .await
        .map_err(AppError::mutation("update the task"))?
        .ok_or_else(|| AppError::not_found("task", task_id))?;
    tracing::info!(user_id = %user_id, task_id, completed, "Task updated");

    if !completed {
        return Ok(Mutated {
            row: task,
            unlocked: Vec::new(),
        });
    }
    streaks::record_quietly(ctx, user_id, StreakType::TaskCompletion, Utc::now()).await;
    let unlocked = achievements::evaluate_quietly(ctx, user_id).await;
    Ok(Mutated { row: task, unlocked })
}

pub async fn delete_task(ctx: &AppContext, user_id: UserId, task_id: DbId) -> AppResult<()> {
    let deleted = TaskRepo::delete(ctx.store(), user_id, task_id)
        .await
        .map_err(AppError::mutation("delete the task"))?;
    if !deleted {
        return Err(AppError::not_found("task", task_id));
    }
    Ok(())
}

/// Trim an optional text field, dropping it when blank.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(trimmed(Some("  ".into())), None);
        assert_eq!(trimmed(Some(" work ".into())), Some("work".to_string()));
        assert_eq!(trimmed(None), None);
    }
}
