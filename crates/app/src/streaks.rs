//! Streak recording and the streak board.

use serde::Serialize;
use tymelyne_core::streaks::{advance, current_value, StreakType};
use tymelyne_core::types::{Timestamp, UserId};
use tymelyne_db::models::streak::{UpsertStreak, UserStreak};
use tymelyne_db::repositories::StreakRepo;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// One line of the streak board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakView {
    pub kind: StreakType,
    pub label: &'static str,
    /// 0 once the streak has lapsed.
    pub current: i32,
    pub longest: i32,
}

/// Record activity of `kind` at `now` and store the advanced counts.
pub async fn record_activity(
    ctx: &AppContext,
    user_id: UserId,
    kind: StreakType,
    now: Timestamp,
) -> AppResult<UserStreak> {
    let prior = StreakRepo::find(ctx.store(), user_id, kind)
        .await
        .map_err(AppError::fetch("streaks"))?;
    let counts = advance(kind, prior.as_ref().map(UserStreak::snapshot), now);
    let row = UpsertStreak {
        user_id,
        streak_type: kind.as_str().to_string(),
        current_count: counts.current,
        longest_count: counts.longest,
        last_updated_at: now,
    };
    let saved = StreakRepo::upsert(ctx.store(), &row)
        .await
        .map_err(AppError::mutation("update your streak"))?;
    tracing::debug!(user_id = %user_id, streak = kind.as_str(), current = counts.current, "Streak recorded");
    Ok(saved)
}

/// Like [`record_activity`], but failures are only logged. Used after a
/// primary mutation that must not fail because of its streak.
pub async fn record_quietly(ctx: &AppContext, user_id: UserId, kind: StreakType, now: Timestamp) {
    if let Err(e) = record_activity(ctx, user_id, kind, now).await {
        tracing::warn!(user_id = %user_id, streak = kind.as_str(), error = %e, "Failed to record streak");
    }
}

/// Every streak type for a user, missing rows reading 0.
pub async fn list_streaks(
    ctx: &AppContext,
    user_id: UserId,
    now: Timestamp,
) -> AppResult<Vec<StreakView>> {
    let rows = StreakRepo::list_for_user(ctx.store(), user_id)
        .await
        .map_err(AppError::fetch("streaks"))?;
    Ok(StreakType::ALL
        .into_iter()
        .map(|kind| {
            let row = rows.iter().find(|r| r.streak_type == kind.as_str());
            StreakView {
                kind,
                label: kind.label(),
                current: row.map_or(0, |r| current_value(kind, &r.snapshot(), now)),
                longest: row.map_or(0, |r| r.longest_count),
            }
        })
        .collect())
}
