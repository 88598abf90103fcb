//! Achievement unlock evaluation and the earned-achievements list.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use tymelyne_core::achievements::{self, AchievementCounts, AchievementDisplay};
use tymelyne_core::streaks::StreakType;
use tymelyne_core::types::{Timestamp, UserId};
use tymelyne_db::repositories::{AchievementRepo, GoalRepo, StreakRepo, TaskRepo};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    /// Codes unlocked by this pass.
    pub newly_unlocked: Vec<String>,
    /// Satisfied codes the user already held, including ones another
    /// evaluation inserted concurrently.
    pub already_unlocked: Vec<String>,
    /// Codes whose unlock write failed. Evaluation continued past them.
    pub failed: Vec<String>,
}

/// An achievement the user holds, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarnedAchievement {
    #[serde(flatten)]
    pub display: AchievementDisplay,
    pub earned_at: Timestamp,
}

/// Gather the counts the unlock rules read.
pub async fn fetch_counts(ctx: &AppContext, user_id: UserId) -> AppResult<AchievementCounts> {
    let store = ctx.store();
    let (goals_created, goals_completed, tasks_completed, login) = tokio::try_join!(
        GoalRepo::count_for_user(store, user_id, None),
        GoalRepo::count_for_user(store, user_id, Some(true)),
        TaskRepo::count_for_user(store, user_id, Some(true)),
        StreakRepo::find(store, user_id, StreakType::DailyLogin),
    )
    .map_err(AppError::fetch("achievement progress"))?;

    Ok(AchievementCounts {
        goals_created,
        goals_completed,
        tasks_completed,
        daily_login_streak: login.map_or(0, |s| s.current_count.max(0) as u64),
    })
}

/// Unlock every satisfied achievement the user does not hold yet.
///
/// Unlock rows are written with an idempotent upsert, so running this
/// twice (or concurrently) never yields two rows for one code.
pub async fn evaluate(ctx: &AppContext, user_id: UserId) -> AppResult<EvaluationReport> {
    let counts = fetch_counts(ctx, user_id).await?;
    let held: HashSet<String> = AchievementRepo::list_unlocked(ctx.store(), user_id)
        .await
        .map_err(AppError::fetch("achievements"))?
        .into_iter()
        .map(|row| row.achievement_code)
        .collect();

    let mut report = EvaluationReport::default();
    let now = Utc::now();
    for def in achievements::eligible(&counts) {
        if held.contains(def.code) {
            report.already_unlocked.push(def.code.to_string());
            continue;
        }
        match AchievementRepo::unlock(ctx.store(), user_id, def.code, now).await {
            Ok(Some(_)) => {
                tracing::info!(user_id = %user_id, code = def.code, "Achievement unlocked");
                report.newly_unlocked.push(def.code.to_string());
            }
            Ok(None) => report.already_unlocked.push(def.code.to_string()),
            Err(e) => {
                tracing::warn!(user_id = %user_id, code = def.code, error = %e, "Failed to record achievement");
                report.failed.push(def.code.to_string());
            }
        }
    }
    Ok(report)
}

/// Like [`evaluate`], but failures are only logged.
pub async fn evaluate_quietly(ctx: &AppContext, user_id: UserId) -> Vec<String> {
    match evaluate(ctx, user_id).await {
        Ok(report) => report.newly_unlocked,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Achievement evaluation failed");
            Vec::new()
        }
    }
}

/// The user's achievements, oldest first.
///
/// Codes missing from the static catalog use the remote definition when
/// there is one, otherwise a fallback icon and a label built from the code.
pub async fn earned(ctx: &AppContext, user_id: UserId) -> AppResult<Vec<EarnedAchievement>> {
    let rows = AchievementRepo::list_unlocked(ctx.store(), user_id)
        .await
        .map_err(AppError::fetch("achievements"))?;

    let unknown: Vec<String> = rows
        .iter()
        .map(|r| r.achievement_code.clone())
        .filter(|code| achievements::find(code).is_none())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let remote: HashMap<String, _> = match AchievementRepo::definitions_for(ctx.store(), &unknown).await {
        Ok(defs) => defs.into_iter().map(|d| (d.code.clone(), d)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load achievement definitions");
            HashMap::new()
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let def = remote.get(&row.achievement_code);
            EarnedAchievement {
                display: achievements::display_for(
                    &row.achievement_code,
                    def.map(|d| (d.title.as_str(), d.description.as_str(), d.icon.as_str())),
                ),
                earned_at: row.earned_at,
            }
        })
        .collect())
}
