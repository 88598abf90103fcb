mod common;

use std::collections::HashMap;

use serde_json::json;
use tymelyne_app::achievements;
use tymelyne_app::goals::{self, NewGoal};
use tymelyne_core::achievements::{COMPLETE_FIRST_GOAL, FALLBACK_ICON, FIRST_GOAL, WEEK_STREAK};
use tymelyne_remote::memory::Op;
use tymelyne_remote::schema::{ACHIEVEMENTS, GOALS, USER_ACHIEVEMENTS, USER_STREAKS};

use common::Harness;

async fn seed_goal(h: &Harness, user_id: uuid::Uuid, completed: bool) {
    h.store
        .seed(
            GOALS,
            vec![json!({
                "user_id": user_id,
                "title": "Run 5k",
                "progress": if completed { 100 } else { 10 },
                "completed": completed,
            })],
        )
        .await
        .unwrap();
}

fn codes_per_row(rows: &[serde_json::Value]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts
            .entry(row["achievement_code"].as_str().unwrap().to_string())
            .or_insert(0) += 1;
    }
    counts
}

#[tokio::test]
async fn evaluating_twice_never_duplicates_unlocks() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    seed_goal(&h, user_id, true).await;

    let first = achievements::evaluate(&h.ctx, user_id).await.unwrap();
    let mut unlocked = first.newly_unlocked.clone();
    unlocked.sort();
    assert_eq!(unlocked, vec![COMPLETE_FIRST_GOAL.to_string(), FIRST_GOAL.to_string()]);

    let second = achievements::evaluate(&h.ctx, user_id).await.unwrap();
    assert!(second.newly_unlocked.is_empty());
    assert_eq!(second.already_unlocked.len(), 2);

    let rows = h.store.rows(USER_ACHIEVEMENTS).await;
    assert!(codes_per_row(&rows).values().all(|&n| n == 1));
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn concurrent_evaluations_write_one_row_per_code() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    seed_goal(&h, user_id, false).await;

    let (a, b) = tokio::join!(
        achievements::evaluate(&h.ctx, user_id),
        achievements::evaluate(&h.ctx, user_id),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.newly_unlocked.len() + b.newly_unlocked.len(), 1);

    let rows = h.store.rows(USER_ACHIEVEMENTS).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["achievement_code"], FIRST_GOAL);
}

#[tokio::test]
async fn failed_unlock_is_reported_and_evaluation_continues() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    seed_goal(&h, user_id, true).await;
    h.store.fail_times(USER_ACHIEVEMENTS, Op::Upsert, 1).await;

    let report = achievements::evaluate(&h.ctx, user_id).await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.newly_unlocked.len(), 1);

    // The failed code is picked up by the next pass.
    let retry = achievements::evaluate(&h.ctx, user_id).await.unwrap();
    assert_eq!(retry.newly_unlocked, report.failed);
}

#[tokio::test]
async fn count_failure_fails_the_evaluation() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    h.store.fail_on(GOALS, Op::Count).await;

    let err = achievements::evaluate(&h.ctx, user_id).await.unwrap_err();
    assert_eq!(err.user_message(), "Could not load achievement progress");
    assert!(h.store.rows(USER_ACHIEVEMENTS).await.is_empty());
}

#[tokio::test]
async fn daily_login_streak_unlocks_week_streak() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    h.store
        .seed(
            USER_STREAKS,
            vec![json!({
                "user_id": user_id,
                "streak_type": "daily_login",
                "current_count": 7,
                "longest_count": 7,
            })],
        )
        .await
        .unwrap();

    let report = achievements::evaluate(&h.ctx, user_id).await.unwrap();
    assert_eq!(report.newly_unlocked, vec![WEEK_STREAK.to_string()]);
}

#[tokio::test]
async fn creating_a_goal_triggers_evaluation() {
    let h = Harness::new();
    let user_id = h.signed_in().await;

    let created = goals::create_goal(
        &h.ctx,
        user_id,
        NewGoal {
            title: "Learn Rust".into(),
            ..NewGoal::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(created.unlocked, vec![FIRST_GOAL.to_string()]);
}

#[tokio::test]
async fn earned_tolerates_codes_missing_from_the_catalog() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    h.store
        .seed(
            USER_ACHIEVEMENTS,
            vec![
                json!({"user_id": user_id, "achievement_code": FIRST_GOAL, "earned_at": "2024-01-01T00:00:00Z"}),
                json!({"user_id": user_id, "achievement_code": "beta_tester", "earned_at": "2024-01-02T00:00:00Z"}),
                json!({"user_id": user_id, "achievement_code": "legacy_badge", "earned_at": "2024-01-03T00:00:00Z"}),
            ],
        )
        .await
        .unwrap();
    h.store
        .seed(
            ACHIEVEMENTS,
            vec![json!({"code": "beta_tester", "title": "Beta Tester", "description": "Joined early", "icon": "flask"})],
        )
        .await
        .unwrap();

    let earned = achievements::earned(&h.ctx, user_id).await.unwrap();
    assert_eq!(earned.len(), 3);

    assert!(earned[0].display.known);
    assert_eq!(earned[1].display.title, "Beta Tester");
    assert_eq!(earned[1].display.icon, "flask");
    assert!(!earned[2].display.known);
    assert_eq!(earned[2].display.icon, FALLBACK_ICON);
}
