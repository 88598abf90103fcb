//! Challenges and participation rows.

use serde::{Deserialize, Serialize};
use tymelyne_core::challenges::ChallengeStatus;
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `challenges` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: DbId,
    pub creator_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// One of `habit`, `goal`, `progress`.
    pub goal_type: String,
    #[serde(default)]
    pub target_count: i32,
    #[serde(default)]
    pub participant_count: i64,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Challenge {
    pub fn status_at(&self, now: Timestamp) -> ChallengeStatus {
        ChallengeStatus::at(self.start_date, self.end_date, now)
    }
}

/// DTO for creating a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChallenge {
    pub creator_id: UserId,
    pub title: String,
    pub description: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub goal_type: String,
    pub target_count: i32,
}

/// A row from the `user_challenges` table. Existence means joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: DbId,
    pub challenge_id: DbId,
    pub user_id: UserId,
    #[serde(default)]
    pub progress: i32,
    #[serde(default)]
    pub joined_at: Option<Timestamp>,
}

/// DTO for joining a challenge.
#[derive(Debug, Clone, Serialize)]
pub struct CreateParticipation {
    pub challenge_id: DbId,
    pub user_id: UserId,
    pub progress: i32,
}
