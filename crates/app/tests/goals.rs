mod common;

use assert_matches::assert_matches;
use tymelyne_app::goals::{self, NewGoal, NewTask};
use tymelyne_app::AppError;
use tymelyne_core::error::CoreError;
use tymelyne_core::goals::TaskFilter;
use tymelyne_remote::memory::Op;
use tymelyne_remote::schema::{USER_ACHIEVEMENTS, USER_STREAKS};

use common::Harness;

fn goal(title: &str, progress: i32) -> NewGoal {
    NewGoal {
        title: title.into(),
        progress,
        ..NewGoal::default()
    }
}

fn task(title: &str, category: Option<&str>) -> NewTask {
    NewTask {
        title: title.into(),
        category: category.map(str::to_string),
        ..NewTask::default()
    }
}

#[tokio::test]
async fn create_goal_validates_input() {
    let h = Harness::new();
    let user_id = h.signed_in().await;

    assert_matches!(
        goals::create_goal(&h.ctx, user_id, goal("  ", 0)).await,
        Err(AppError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        goals::create_goal(&h.ctx, user_id, goal("Read", 101)).await,
        Err(AppError::Core(CoreError::Validation(_)))
    );

    let created = goals::create_goal(&h.ctx, user_id, goal("Read", 100)).await.unwrap();
    assert!(created.row.completed);
}

#[tokio::test]
async fn progress_updates_complete_and_reopen() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let id = goals::create_goal(&h.ctx, user_id, goal("Run", 20)).await.unwrap().row.id;

    let done = goals::set_goal_progress(&h.ctx, user_id, id, 150).await.unwrap();
    assert_eq!(done.row.progress, 100);
    assert!(done.row.completed);

    let reopened = goals::set_goal_progress(&h.ctx, user_id, id, 40).await.unwrap();
    assert!(!reopened.row.completed);

    let listed = goals::list_goals(&h.ctx, user_id).await.unwrap();
    assert_eq!(listed[0].display_progress, 40);

    let streaks = h.store.rows(USER_STREAKS).await;
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0]["streak_type"], "goal_progress");
}

#[tokio::test]
async fn completing_a_goal_unlocks_its_achievement() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let id = goals::create_goal(&h.ctx, user_id, goal("Run", 0)).await.unwrap().row.id;

    let completed = goals::complete_goal(&h.ctx, user_id, id).await.unwrap();
    assert_eq!(completed.unlocked, vec!["complete_first_goal".to_string()]);
    assert_eq!(completed.row.display_progress(), 100);
    assert_eq!(h.store.rows(USER_ACHIEVEMENTS).await.len(), 2);
}

#[tokio::test]
async fn missing_goal_is_not_found() {
    let h = Harness::new();
    let user_id = h.signed_in().await;

    assert_matches!(
        goals::set_goal_progress(&h.ctx, user_id, 999, 10).await,
        Err(AppError::Core(CoreError::NotFound { entity: "goal", .. }))
    );
    assert_matches!(
        goals::delete_goal(&h.ctx, user_id, 999).await,
        Err(AppError::Core(CoreError::NotFound { .. }))
    );
}

#[tokio::test]
async fn task_filters_and_categories() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let a = goals::create_task(&h.ctx, user_id, task("Email", Some("work"))).await.unwrap().row;
    goals::create_task(&h.ctx, user_id, task("Gym", Some("health"))).await.unwrap();
    goals::create_task(&h.ctx, user_id, task("Report", Some("work"))).await.unwrap();
    goals::set_task_completed(&h.ctx, user_id, a.id, true).await.unwrap();

    let done = goals::list_tasks(&h.ctx, user_id, TaskFilter::Completed, None).await.unwrap();
    assert_eq!(done.len(), 1);
    let pending = goals::list_tasks(&h.ctx, user_id, TaskFilter::Pending, None).await.unwrap();
    assert_eq!(pending.len(), 2);
    let work = goals::list_tasks(&h.ctx, user_id, TaskFilter::All, Some("work")).await.unwrap();
    assert_eq!(work.len(), 2);
}

#[tokio::test]
async fn completing_a_task_records_the_streak() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let id = goals::create_task(&h.ctx, user_id, task("Email", None)).await.unwrap().row.id;

    goals::set_task_completed(&h.ctx, user_id, id, true).await.unwrap();
    let streaks = h.store.rows(USER_STREAKS).await;
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0]["streak_type"], "task_completion");

    // Reopening a task does not count as activity.
    goals::set_task_completed(&h.ctx, user_id, id, false).await.unwrap();
    assert_eq!(h.store.calls(USER_STREAKS, Op::Upsert).await, 1);
}

#[tokio::test]
async fn follow_up_failures_do_not_fail_the_mutation() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let id = goals::create_task(&h.ctx, user_id, task("Email", None)).await.unwrap().row.id;
    h.store.fail_on(USER_STREAKS, Op::Upsert).await;
    h.store.fail_on(USER_ACHIEVEMENTS, Op::Select).await;

    let updated = goals::set_task_completed(&h.ctx, user_id, id, true).await.unwrap();
    assert!(updated.row.completed);
    assert!(updated.unlocked.is_empty());
}

#[tokio::test]
async fn delete_task_removes_only_owned_rows() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let id = goals::create_task(&h.ctx, user_id, task("Email", None)).await.unwrap().row.id;

    assert!(goals::delete_task(&h.ctx, uuid::Uuid::new_v4(), id).await.is_err());
    goals::delete_task(&h.ctx, user_id, id).await.unwrap();
    assert!(goals::list_tasks(&h.ctx, user_id, TaskFilter::All, None).await.unwrap().is_empty());
}
