//! Per-principal preference rows.

use serde::{Deserialize, Serialize};
use tymelyne_core::preferences::{
    DEFAULT_DARK_MODE, DEFAULT_EMAIL_NOTIFICATIONS, DEFAULT_LANGUAGE, DEFAULT_PUSH_NOTIFICATIONS,
    DEFAULT_TIMEZONE, DEFAULT_WEEKLY_REPORT,
};
use tymelyne_core::types::{Timestamp, UserId};

/// A row from the `user_preferences` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: UserId,
    pub dark_mode: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub weekly_report: bool,
    pub timezone: String,
    pub language: String,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl UserPreferences {
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            dark_mode: DEFAULT_DARK_MODE,
            email_notifications: DEFAULT_EMAIL_NOTIFICATIONS,
            push_notifications: DEFAULT_PUSH_NOTIFICATIONS,
            weekly_report: DEFAULT_WEEKLY_REPORT,
            timezone: DEFAULT_TIMEZONE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            updated_at: None,
        }
    }
}

/// DTO for preference edits. All fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePreferences {
    pub dark_mode: Option<bool>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub weekly_report: Option<bool>,
    pub timezone: Option<String>,
    pub language: Option<String>,
}

impl UpdatePreferences {
    /// Apply the present fields onto `prefs`.
    pub fn apply_to(&self, prefs: &mut UserPreferences) {
        if let Some(v) = self.dark_mode {
            prefs.dark_mode = v;
        }
        if let Some(v) = self.email_notifications {
            prefs.email_notifications = v;
        }
        if let Some(v) = self.push_notifications {
            prefs.push_notifications = v;
        }
        if let Some(v) = self.weekly_report {
            prefs.weekly_report = v;
        }
        if let Some(v) = &self.timezone {
            prefs.timezone = v.clone();
        }
        if let Some(v) = &self.language {
            prefs.language = v.clone();
        }
    }
}
