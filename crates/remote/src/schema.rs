//! Table names and natural keys of the hosted schema.
//!
//! The unique keys listed here back every idempotent write: they are sent
//! as PostgREST `on_conflict` targets and enforced by the in-memory store.

pub const PROFILES: &str = "profiles";
pub const GOALS: &str = "goals";
pub const TASKS: &str = "tasks";
pub const ACHIEVEMENTS: &str = "achievements";
pub const USER_ACHIEVEMENTS: &str = "user_achievements";
pub const USER_STREAKS: &str = "user_streaks";
pub const POSTS: &str = "posts";
pub const POST_LIKES: &str = "post_likes";
pub const COMMENTS: &str = "comments";
pub const CHALLENGES: &str = "challenges";
pub const USER_CHALLENGES: &str = "user_challenges";
pub const USER_PREFERENCES: &str = "user_preferences";

/// Shape of one table as far as the client needs to know it.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    /// Whether the store assigns a BIGSERIAL `id` on insert.
    pub auto_id: bool,
    /// Columns the store fills with the current time when absent on insert.
    pub default_now: &'static [&'static str],
    /// Natural unique keys (besides `id`).
    pub unique: &'static [&'static [&'static str]],
}

impl TableSpec {
    /// The primary natural key, used as the default upsert target.
    pub fn natural_key(&self) -> Option<&'static [&'static str]> {
        self.unique.first().copied()
    }
}

pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: PROFILES,
        auto_id: false,
        default_now: &["created_at", "updated_at"],
        unique: &[&["id"], &["username"]],
    },
    TableSpec {
        name: GOALS,
        auto_id: true,
        default_now: &["created_at", "updated_at"],
        unique: &[],
    },
    TableSpec {
        name: TASKS,
        auto_id: true,
        default_now: &["created_at", "updated_at"],
        unique: &[],
    },
    TableSpec {
        name: ACHIEVEMENTS,
        auto_id: false,
        default_now: &[],
        unique: &[&["code"]],
    },
    TableSpec {
        name: USER_ACHIEVEMENTS,
        auto_id: true,
        default_now: &["earned_at"],
        unique: &[&["user_id", "achievement_code"]],
    },
    TableSpec {
        name: USER_STREAKS,
        auto_id: true,
        default_now: &["last_updated_at"],
        unique: &[&["user_id", "streak_type"]],
    },
    TableSpec {
        name: POSTS,
        auto_id: true,
        default_now: &["created_at"],
        unique: &[],
    },
    TableSpec {
        name: POST_LIKES,
        auto_id: false,
        default_now: &["created_at"],
        unique: &[&["post_id", "user_id"]],
    },
    TableSpec {
        name: COMMENTS,
        auto_id: true,
        default_now: &["created_at"],
        unique: &[],
    },
    TableSpec {
        name: CHALLENGES,
        auto_id: true,
        default_now: &["created_at"],
        unique: &[],
    },
    TableSpec {
        name: USER_CHALLENGES,
        auto_id: true,
        default_now: &["joined_at"],
        unique: &[&["challenge_id", "user_id"]],
    },
    TableSpec {
        name: USER_PREFERENCES,
        auto_id: false,
        default_now: &["updated_at"],
        unique: &[&["user_id"]],
    },
];

/// Look up a table by name.
pub fn table(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_is_listed_once() {
        let names = [
            PROFILES,
            GOALS,
            TASKS,
            ACHIEVEMENTS,
            USER_ACHIEVEMENTS,
            USER_STREAKS,
            POSTS,
            POST_LIKES,
            COMMENTS,
            CHALLENGES,
            USER_CHALLENGES,
            USER_PREFERENCES,
        ];
        for name in names {
            assert_eq!(TABLES.iter().filter(|t| t.name == name).count(), 1, "{name}");
        }
        assert_eq!(TABLES.len(), names.len());
    }

    #[test]
    fn unlock_rows_keyed_by_owner_and_code() {
        let layout = table(USER_ACHIEVEMENTS).unwrap();
        assert_eq!(layout.natural_key(), Some(&["user_id", "achievement_code"][..]));
    }
}
