//! Streak arithmetic.
//!
//! Daily streaks count consecutive UTC calendar days with activity; the
//! weekly review streak counts consecutive ISO weeks.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const STREAK_DAILY_LOGIN: &str = "daily_login";
pub const STREAK_TASK_COMPLETION: &str = "task_completion";
pub const STREAK_GOAL_PROGRESS: &str = "goal_progress";
pub const STREAK_WEEKLY_REVIEW: &str = "weekly_review";

pub const VALID_STREAK_TYPES: &[&str] = &[
    STREAK_DAILY_LOGIN,
    STREAK_TASK_COMPLETION,
    STREAK_GOAL_PROGRESS,
    STREAK_WEEKLY_REVIEW,
];

/// Kind of activity a streak tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakType {
    DailyLogin,
    TaskCompletion,
    GoalProgress,
    WeeklyReview,
}

impl StreakType {
    pub const ALL: [StreakType; 4] = [
        Self::DailyLogin,
        Self::TaskCompletion,
        Self::GoalProgress,
        Self::WeeklyReview,
    ];

    /// Convert from the stored string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STREAK_DAILY_LOGIN => Ok(Self::DailyLogin),
            STREAK_TASK_COMPLETION => Ok(Self::TaskCompletion),
            STREAK_GOAL_PROGRESS => Ok(Self::GoalProgress),
            STREAK_WEEKLY_REVIEW => Ok(Self::WeeklyReview),
            _ => Err(CoreError::Validation(format!(
                "Invalid streak type '{s}'. Must be one of: {}",
                VALID_STREAK_TYPES.join(", ")
            ))),
        }
    }

    /// Convert to the stored string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyLogin => STREAK_DAILY_LOGIN,
            Self::TaskCompletion => STREAK_TASK_COMPLETION,
            Self::GoalProgress => STREAK_GOAL_PROGRESS,
            Self::WeeklyReview => STREAK_WEEKLY_REVIEW,
        }
    }

    /// Label used on the streak board.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DailyLogin => "Daily Login",
            Self::TaskCompletion => "Task Completion",
            Self::GoalProgress => "Goal Progress",
            Self::WeeklyReview => "Weekly Reviews",
        }
    }

    fn is_weekly(&self) -> bool {
        matches!(self, Self::WeeklyReview)
    }
}

/// Current and longest counts after recording activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakCounts {
    pub current: i32,
    pub longest: i32,
}

/// Previously stored streak state, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakSnapshot {
    pub current: i32,
    pub longest: i32,
    pub last_updated_at: Timestamp,
}

/// Record activity at `now` against an optional prior snapshot.
///
/// Activity in the same period leaves counts unchanged, activity in the
/// next period extends the streak, anything later restarts it at 1.
pub fn advance(kind: StreakType, prior: Option<StreakSnapshot>, now: Timestamp) -> StreakCounts {
    let Some(prior) = prior else {
        return StreakCounts {
            current: 1,
            longest: 1,
        };
    };

    let gap = period_gap(kind, prior.last_updated_at.date_naive(), now.date_naive());
    let current = match gap {
        g if g <= 0 => prior.current.max(1),
        1 => prior.current.saturating_add(1),
        _ => 1,
    };
    StreakCounts {
        current,
        longest: prior.longest.max(current),
    }
}

/// Streak value as displayed at `now`: a streak whose last activity is
/// older than one period has lapsed and reads 0.
pub fn current_value(kind: StreakType, snapshot: &StreakSnapshot, now: Timestamp) -> i32 {
    if period_gap(kind, snapshot.last_updated_at.date_naive(), now.date_naive()) > 1 {
        0
    } else {
        snapshot.current
    }
}

/// Number of whole periods between two dates.
fn period_gap(kind: StreakType, from: NaiveDate, to: NaiveDate) -> i64 {
    if kind.is_weekly() {
        let from_week = from.week(chrono::Weekday::Mon).first_day();
        let to_week = to.week(chrono::Weekday::Mon).first_day();
        (to_week - from_week).num_days().div_euclid(7)
    } else {
        (to - from).num_days()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn snap(current: i32, longest: i32, last: Timestamp) -> Option<StreakSnapshot> {
        Some(StreakSnapshot {
            current,
            longest,
            last_updated_at: last,
        })
    }

    #[test]
    fn first_activity_starts_at_one() {
        let counts = advance(StreakType::DailyLogin, None, at(2025, 1, 10, 9));
        assert_eq!(counts, StreakCounts { current: 1, longest: 1 });
    }

    #[test]
    fn same_day_is_unchanged() {
        let counts = advance(
            StreakType::DailyLogin,
            snap(4, 9, at(2025, 1, 10, 1)),
            at(2025, 1, 10, 23),
        );
        assert_eq!(counts, StreakCounts { current: 4, longest: 9 });
    }

    #[test]
    fn next_day_extends() {
        let counts = advance(
            StreakType::DailyLogin,
            snap(6, 6, at(2025, 1, 10, 23)),
            at(2025, 1, 11, 0),
        );
        assert_eq!(counts, StreakCounts { current: 7, longest: 7 });
    }

    #[test]
    fn gap_resets_but_keeps_longest() {
        let counts = advance(
            StreakType::TaskCompletion,
            snap(12, 14, at(2025, 1, 10, 9)),
            at(2025, 1, 13, 9),
        );
        assert_eq!(counts, StreakCounts { current: 1, longest: 14 });
    }

    #[test]
    fn weekly_review_uses_iso_weeks() {
        // 2025-01-10 is a Friday; 2025-01-13 is the following Monday.
        let counts = advance(
            StreakType::WeeklyReview,
            snap(2, 2, at(2025, 1, 10, 9)),
            at(2025, 1, 13, 9),
        );
        assert_eq!(counts.current, 3);

        let counts = advance(
            StreakType::WeeklyReview,
            snap(2, 2, at(2025, 1, 10, 9)),
            at(2025, 1, 12, 9),
        );
        assert_eq!(counts.current, 2);

        let counts = advance(
            StreakType::WeeklyReview,
            snap(2, 5, at(2025, 1, 10, 9)),
            at(2025, 1, 10, 9) + Duration::days(15),
        );
        assert_eq!(counts, StreakCounts { current: 1, longest: 5 });
    }

    #[test]
    fn lapsed_streak_reads_zero() {
        let snapshot = StreakSnapshot {
            current: 5,
            longest: 5,
            last_updated_at: at(2025, 1, 10, 9),
        };
        assert_eq!(current_value(StreakType::DailyLogin, &snapshot, at(2025, 1, 11, 9)), 5);
        assert_eq!(current_value(StreakType::DailyLogin, &snapshot, at(2025, 1, 12, 9)), 0);
    }

    #[test]
    fn streak_type_round_trips_through_str() {
        for kind in StreakType::ALL {
            assert_eq!(StreakType::from_str_value(kind.as_str()).unwrap(), kind);
        }
        assert!(StreakType::from_str_value("hourly").is_err());
    }
}
