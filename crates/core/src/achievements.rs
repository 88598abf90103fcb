//! Achievement catalog and unlock rules.
//!
//! The catalog is static. Unlock eligibility is a pure function of a
//! principal's counts; persisting unlocks is the caller's job.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const FIRST_GOAL: &str = "first_goal";
pub const COMPLETE_FIRST_GOAL: &str = "complete_first_goal";
pub const GOAL_MASTER: &str = "goal_master";
pub const GOAL_EXPERT: &str = "goal_expert";
pub const TASK_STARTER: &str = "task_starter";
pub const TASK_CHAMPION: &str = "task_champion";
pub const TASK_MASTER: &str = "task_master";
pub const WEEK_STREAK: &str = "week_streak";
pub const MONTH_STREAK: &str = "month_streak";

/// Icon tag shown for codes missing from every catalog.
pub const FALLBACK_ICON: &str = "award";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The count an achievement rule is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    GoalsCreated,
    GoalsCompleted,
    TasksCompleted,
    DailyLoginStreak,
}

/// A principal's counts relevant to achievements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AchievementCounts {
    pub goals_created: u64,
    pub goals_completed: u64,
    pub tasks_completed: u64,
    pub daily_login_streak: u64,
}

impl AchievementCounts {
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::GoalsCreated => self.goals_created,
            Metric::GoalsCompleted => self.goals_completed,
            Metric::TasksCompleted => self.tasks_completed,
            Metric::DailyLoginStreak => self.daily_login_streak,
        }
    }
}

/// A static achievement definition with its unlock criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDef {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub metric: Metric,
    pub threshold: u64,
}

impl AchievementDef {
    /// Whether the given counts satisfy this definition.
    pub fn is_met(&self, counts: &AchievementCounts) -> bool {
        counts.get(self.metric) >= self.threshold
    }
}

/// Display data for an earned achievement, resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementDisplay {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    /// `false` when neither the static catalog nor a remote definition knew
    /// the code.
    pub known: bool,
}

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        code: FIRST_GOAL,
        title: "First Goal Set",
        description: "Created your first goal",
        icon: "target",
        metric: Metric::GoalsCreated,
        threshold: 1,
    },
    AchievementDef {
        code: COMPLETE_FIRST_GOAL,
        title: "Goal Getter",
        description: "Completed your first goal",
        icon: "check-circle",
        metric: Metric::GoalsCompleted,
        threshold: 1,
    },
    AchievementDef {
        code: GOAL_MASTER,
        title: "Goal Master",
        description: "Completed 3 goals",
        icon: "trophy",
        metric: Metric::GoalsCompleted,
        threshold: 3,
    },
    AchievementDef {
        code: GOAL_EXPERT,
        title: "Goal Expert",
        description: "Completed 10 goals",
        icon: "trophy",
        metric: Metric::GoalsCompleted,
        threshold: 10,
    },
    AchievementDef {
        code: TASK_STARTER,
        title: "Task Starter",
        description: "Completed 10 tasks",
        icon: "check-square",
        metric: Metric::TasksCompleted,
        threshold: 10,
    },
    AchievementDef {
        code: TASK_CHAMPION,
        title: "Task Champion",
        description: "Completed 50 tasks",
        icon: "star",
        metric: Metric::TasksCompleted,
        threshold: 50,
    },
    AchievementDef {
        code: TASK_MASTER,
        title: "Task Master",
        description: "Completed 100 tasks",
        icon: "star",
        metric: Metric::TasksCompleted,
        threshold: 100,
    },
    AchievementDef {
        code: WEEK_STREAK,
        title: "7-Day Streak",
        description: "Used TymeLyne for 7 consecutive days",
        icon: "zap",
        metric: Metric::DailyLoginStreak,
        threshold: 7,
    },
    AchievementDef {
        code: MONTH_STREAK,
        title: "30-Day Streak",
        description: "Used TymeLyne for 30 consecutive days",
        icon: "zap",
        metric: Metric::DailyLoginStreak,
        threshold: 30,
    },
];

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Look up a definition in the static catalog.
pub fn find(code: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.code == code)
}

/// All definitions whose criteria the counts satisfy, in catalog order.
pub fn eligible(counts: &AchievementCounts) -> Vec<&'static AchievementDef> {
    CATALOG.iter().filter(|def| def.is_met(counts)).collect()
}

/// Eligible definitions not already in `unlocked`.
pub fn newly_eligible<'a, I>(counts: &AchievementCounts, unlocked: I) -> Vec<&'static AchievementDef>
where
    I: IntoIterator<Item = &'a str>,
{
    let unlocked: Vec<&str> = unlocked.into_iter().collect();
    eligible(counts)
        .into_iter()
        .filter(|def| !unlocked.contains(&def.code))
        .collect()
}

/// Resolve display data for a code.
///
/// `remote` is an optional `(title, description, icon)` from the remote
/// definitions table, used when the static catalog lacks the code.
pub fn display_for(code: &str, remote: Option<(&str, &str, &str)>) -> AchievementDisplay {
    if let Some(def) = find(code) {
        return AchievementDisplay {
            code: code.to_string(),
            title: def.title.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            known: true,
        };
    }
    match remote {
        Some((title, description, icon)) => AchievementDisplay {
            code: code.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: if icon.is_empty() { FALLBACK_ICON } else { icon }.to_string(),
            known: true,
        },
        None => AchievementDisplay {
            code: code.to_string(),
            title: label_from_code(code),
            description: String::new(),
            icon: FALLBACK_ICON.to_string(),
            known: false,
        },
    }
}

/// Turn `some_code` into `Some Code`.
pub fn label_from_code(code: &str) -> String {
    code.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(defs: &[&AchievementDef]) -> Vec<&'static str> {
        defs.iter().map(|d| d.code).collect()
    }

    #[test]
    fn catalog_codes_are_unique() {
        let mut seen = Vec::new();
        for def in CATALOG {
            assert!(!seen.contains(&def.code), "duplicate code {}", def.code);
            seen.push(def.code);
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn nothing_eligible_for_new_user() {
        assert!(eligible(&AchievementCounts::default()).is_empty());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let counts = AchievementCounts {
            goals_created: 1,
            goals_completed: 3,
            tasks_completed: 50,
            daily_login_streak: 7,
        };
        assert_eq!(
            codes(&eligible(&counts)),
            vec![
                FIRST_GOAL,
                COMPLETE_FIRST_GOAL,
                GOAL_MASTER,
                TASK_STARTER,
                TASK_CHAMPION,
                WEEK_STREAK
            ]
        );
    }

    #[test]
    fn already_unlocked_codes_are_skipped() {
        let counts = AchievementCounts {
            goals_created: 2,
            goals_completed: 1,
            ..Default::default()
        };
        let fresh = newly_eligible(&counts, [FIRST_GOAL]);
        assert_eq!(codes(&fresh), vec![COMPLETE_FIRST_GOAL]);
    }

    #[test]
    fn display_prefers_static_catalog() {
        let display = display_for(GOAL_MASTER, Some(("Other", "Other", "x")));
        assert_eq!(display.title, "Goal Master");
        assert!(display.known);
    }

    #[test]
    fn display_uses_remote_definition() {
        let display = display_for("early_bird", Some(("Early Bird", "Up at dawn", "")));
        assert_eq!(display.title, "Early Bird");
        assert_eq!(display.icon, FALLBACK_ICON);
        assert!(display.known);
    }

    #[test]
    fn unknown_code_falls_back() {
        let display = display_for("secret_night_owl", None);
        assert_eq!(display.title, "Secret Night Owl");
        assert_eq!(display.icon, FALLBACK_ICON);
        assert!(!display.known);
    }
}
