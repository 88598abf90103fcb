//! Challenge board, joining, and participant progress.

use std::collections::HashMap;

use serde::Serialize;
use tymelyne_core::challenges::{
    clamp_progress, days_left, progress_pct, validate_challenge, ChallengeGoalType,
    ChallengeStatus,
};
use tymelyne_core::error::CoreError;
use tymelyne_core::goals::validate_title;
use tymelyne_core::types::{DbId, Timestamp, UserId};
use tymelyne_db::models::challenge::{Challenge, CreateChallenge, Participation};
use tymelyne_db::repositories::{ChallengeRepo, ParticipationRepo};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// A challenge as shown to one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeView {
    pub challenge: Challenge,
    pub status: ChallengeStatus,
    pub status_label: &'static str,
    pub joined: bool,
    pub action_label: &'static str,
    pub progress: i32,
    pub progress_pct: u8,
    pub days_left: i64,
}

impl ChallengeView {
    pub fn build(challenge: Challenge, participation: Option<&Participation>, now: Timestamp) -> Self {
        let status = challenge.status_at(now);
        let joined = participation.is_some();
        let progress = participation.map_or(0, |p| p.progress);
        Self {
            status,
            status_label: status.label(),
            joined,
            action_label: status.action_label(joined),
            progress,
            progress_pct: progress_pct(progress, challenge.target_count),
            days_left: days_left(challenge.end_date, now),
            challenge,
        }
    }
}

/// Every challenge with the viewer's participation.
pub async fn list(ctx: &AppContext, user_id: UserId, now: Timestamp) -> AppResult<Vec<ChallengeView>> {
    let store = ctx.store();
    let (challenges, joined) = tokio::try_join!(
        ChallengeRepo::list(store),
        ParticipationRepo::list_for_user(store, user_id),
    )
    .map_err(AppError::fetch("challenges"))?;

    let joined: HashMap<DbId, Participation> =
        joined.into_iter().map(|p| (p.challenge_id, p)).collect();
    Ok(challenges
        .into_iter()
        .map(|c| {
            let participation = joined.get(&c.id);
            ChallengeView::build(c, participation, now)
        })
        .collect())
}

async fn find_challenge(ctx: &AppContext, challenge_id: DbId) -> AppResult<Challenge> {
    ChallengeRepo::find_by_id(ctx.store(), challenge_id)
        .await
        .map_err(AppError::fetch("the challenge"))?
        .ok_or_else(|| AppError::not_found("challenge", challenge_id))
}

/// Join a challenge. Joining twice is a no-op.
pub async fn join(
    ctx: &AppContext,
    user_id: UserId,
    challenge_id: DbId,
    now: Timestamp,
) -> AppResult<ChallengeView> {
    let challenge = find_challenge(ctx, challenge_id).await?;
    if challenge.status_at(now) == ChallengeStatus::Completed {
        return Err(CoreError::Conflict("This challenge has already ended".to_string()).into());
    }
    let participation = match ParticipationRepo::join(ctx.store(), challenge_id, user_id)
        .await
        .map_err(AppError::mutation("join the challenge"))?
    {
        Some(row) => {
            tracing::info!(user_id = %user_id, challenge_id, "Joined challenge");
            row
        }
        None => ParticipationRepo::find(ctx.store(), challenge_id, user_id)
            .await
            .map_err(AppError::fetch("your participation"))?
            .ok_or_else(|| AppError::not_found("participation", challenge_id))?,
    };
    Ok(ChallengeView::build(challenge, Some(&participation), now))
}

/// Leave a challenge. Returns `false` if the viewer had not joined.
pub async fn leave(ctx: &AppContext, user_id: UserId, challenge_id: DbId) -> AppResult<bool> {
    let removed = ParticipationRepo::leave(ctx.store(), challenge_id, user_id)
        .await
        .map_err(AppError::mutation("leave the challenge"))?;
    if removed {
        tracing::info!(user_id = %user_id, challenge_id, "Left challenge");
    }
    Ok(removed)
}

/// Store the viewer's progress, clamped to `[0, target_count]`.
pub async fn update_progress(
    ctx: &AppContext,
    user_id: UserId,
    challenge_id: DbId,
    value: i32,
    now: Timestamp,
) -> AppResult<ChallengeView> {
    let challenge = find_challenge(ctx, challenge_id).await?;
    let progress = clamp_progress(value, challenge.target_count);
    if progress != value {
        tracing::debug!(challenge_id, value, progress, "Challenge progress clamped");
    }
    let participation = ParticipationRepo::set_progress(ctx.store(), challenge_id, user_id, progress)
        .await
        .map_err(AppError::mutation("update your progress"))?
        .ok_or_else(|| {
            AppError::from(CoreError::Conflict(
                "Join the challenge before recording progress".to_string(),
            ))
        })?;
    Ok(ChallengeView::build(challenge, Some(&participation), now))
}

/// Input for [`create`].
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub goal_type: ChallengeGoalType,
    pub target_count: i32,
}

pub async fn create(
    ctx: &AppContext,
    creator_id: UserId,
    input: NewChallenge,
    now: Timestamp,
) -> AppResult<ChallengeView> {
    validate_title(&input.title)?;
    validate_challenge(input.start_date, input.end_date, input.target_count)?;
    let row = CreateChallenge {
        creator_id,
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        start_date: input.start_date,
        end_date: input.end_date,
        goal_type: input.goal_type.as_str().to_string(),
        target_count: input.target_count,
    };
    let challenge = ChallengeRepo::create(ctx.store(), &row)
        .await
        .map_err(AppError::mutation("create the challenge"))?;
    tracing::info!(challenge_id = challenge.id, "Challenge created");
    Ok(ChallengeView::build(challenge, None, now))
}
