//! User preference defaults and validation.

use crate::error::CoreError;

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages the interface is translated into.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "pt"];

pub const DEFAULT_DARK_MODE: bool = false;
pub const DEFAULT_EMAIL_NOTIFICATIONS: bool = true;
pub const DEFAULT_PUSH_NOTIFICATIONS: bool = true;
pub const DEFAULT_WEEKLY_REPORT: bool = true;

/// Validate a language code against the supported list.
pub fn validate_language(language: &str) -> Result<(), CoreError> {
    if SUPPORTED_LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported language '{language}'. Must be one of: {}",
            SUPPORTED_LANGUAGES.join(", ")
        )))
    }
}

/// Validate a timezone name. Only the shape is checked (`UTC` or
/// `Area/Location`); the store does not know the tz database.
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    let tz = timezone.trim();
    let well_formed = tz == "UTC"
        || (tz.contains('/')
            && tz
                .split('/')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || "_-+".contains(c))));
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Invalid timezone '{timezone}'")))
    }
}
