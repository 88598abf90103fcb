//! Per-user settings.

use tymelyne_core::preferences::{validate_language, validate_timezone};
use tymelyne_core::types::UserId;
use tymelyne_db::models::preference::{UpdatePreferences, UserPreferences};
use tymelyne_db::repositories::PreferenceRepo;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// Fetch the user's preferences, creating the default row on first use.
///
/// The insert ignores duplicates, so a concurrent first load by another
/// client re-reads the winner's row instead of failing.
pub async fn load_or_create(ctx: &AppContext, user_id: UserId) -> AppResult<UserPreferences> {
    let store = ctx.store();
    if let Some(prefs) = PreferenceRepo::find(store, user_id)
        .await
        .map_err(AppError::fetch("your preferences"))?
    {
        return Ok(prefs);
    }

    match PreferenceRepo::create_default(store, user_id)
        .await
        .map_err(AppError::mutation("save default preferences"))?
    {
        Some(created) => {
            tracing::info!(user_id = %user_id, "Default preferences created");
            Ok(created)
        }
        None => PreferenceRepo::find(store, user_id)
            .await
            .map_err(AppError::fetch("your preferences"))?
            .ok_or_else(|| AppError::not_found("preferences", user_id)),
    }
}

/// Apply an edit and save the full row.
pub async fn save(
    ctx: &AppContext,
    user_id: UserId,
    patch: &UpdatePreferences,
) -> AppResult<UserPreferences> {
    if let Some(language) = &patch.language {
        validate_language(language)?;
    }
    if let Some(timezone) = &patch.timezone {
        validate_timezone(timezone)?;
    }
    let mut prefs = load_or_create(ctx, user_id).await?;
    patch.apply_to(&mut prefs);
    let saved = PreferenceRepo::save(ctx.store(), &prefs)
        .await
        .map_err(AppError::mutation("save your preferences"))?;
    tracing::debug!(user_id = %user_id, "Preferences saved");
    Ok(saved)
}
