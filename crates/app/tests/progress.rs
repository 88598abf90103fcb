mod common;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tymelyne_app::progress::{self, ViewState};
use tymelyne_core::quotes::quote_for;
use tymelyne_remote::memory::Op;
use tymelyne_remote::schema::{GOALS, TASKS, USER_ACHIEVEMENTS};

use common::Harness;

async fn seed_activity(h: &Harness, user_id: uuid::Uuid) {
    h.store
        .seed(
            GOALS,
            vec![
                json!({"user_id": user_id, "title": "a", "progress": 50, "completed": false}),
                json!({"user_id": user_id, "title": "b", "progress": 30, "completed": true}),
            ],
        )
        .await
        .unwrap();
    h.store
        .seed(
            TASKS,
            vec![
                json!({"user_id": user_id, "title": "x", "completed": true}),
                json!({"user_id": user_id, "title": "y", "completed": true}),
                json!({"user_id": user_id, "title": "z", "completed": false}),
            ],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn progress_view_from_rows() {
    let h = Harness::new();
    let user_id = uuid::Uuid::new_v4();
    h.seed_profile(user_id, "Alex", "Chen", 2500).await;
    seed_activity(&h, user_id).await;

    let view = progress::fetch_progress(&h.ctx, user_id).await.unwrap();
    assert_eq!(view.level, 3);
    assert_eq!(view.current_xp, 2200);
    assert_eq!(view.next_level_xp, 1300);
    assert_eq!(view.remaining_xp, 1000);
    assert_eq!(view.task_completion_pct, 67);
    assert_eq!(view.goal_completion_pct, 50);
}

#[tokio::test]
async fn no_rows_reads_zero_percent() {
    let h = Harness::new();
    let user_id = h.signed_in().await;

    let view = progress::fetch_progress(&h.ctx, user_id).await.unwrap();
    assert_eq!(view.level, 1);
    assert_eq!(view.task_completion_pct, 0);
    assert_eq!(view.goal_completion_pct, 0);
}

#[tokio::test]
async fn failed_fetch_is_unavailable_not_zero() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    h.store.fail_on(TASKS, Op::Select).await;

    match progress::load_progress(&h.ctx, user_id).await {
        ViewState::Unavailable { message, retryable } => {
            assert_eq!(message, "Could not load your progress");
            assert!(retryable);
        }
        ViewState::Ready(view) => panic!("expected unavailable, got {view:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_as_retryable() {
    let h = Harness::with_timeout(Duration::from_secs(1));
    let user_id = h.signed_in().await;
    h.store.set_latency(Some(Duration::from_secs(30))).await;

    let state = progress::load_progress(&h.ctx, user_id).await;
    assert_eq!(
        state,
        ViewState::Unavailable {
            message: "Loading your progress timed out. Please try again.".to_string(),
            retryable: true,
        }
    );
}

#[tokio::test]
async fn dashboard_summarises_activity() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    seed_activity(&h, user_id).await;
    h.store
        .seed(
            USER_ACHIEVEMENTS,
            vec![json!({"user_id": user_id, "achievement_code": "first_goal"})],
        )
        .await
        .unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap();

    let overview = progress::fetch_dashboard(&h.ctx, user_id, now).await.unwrap();
    assert_eq!(overview.goals_in_progress, 1);
    assert_eq!(overview.tasks_completed, 2);
    assert_eq!(overview.tasks_total, 3);
    // (50 + 100) / 2: the completed goal counts as 100.
    assert_eq!(overview.overall_progress_pct, 75);
    assert_eq!(overview.achievements_earned, 1);
    assert_eq!(overview.streaks.len(), 4);
    assert!(overview.streaks.iter().all(|s| s.current == 0));
    assert_eq!(overview.quote, quote_for(now.date_naive()));
}

#[tokio::test]
async fn dashboard_failure_is_unavailable() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    h.store.fail_on(USER_ACHIEVEMENTS, Op::Count).await;

    let state = progress::load_dashboard(&h.ctx, user_id, Utc::now()).await;
    assert!(state.ready().is_none());
}
