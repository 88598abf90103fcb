//! Repository for the `user_preferences` table.

use chrono::Utc;
use tymelyne_core::types::UserId;
use tymelyne_remote::schema::USER_PREFERENCES;
use tymelyne_remote::store::{fetch_optional, upsert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore, Upsert};

use crate::models::preference::UserPreferences;

const PREFERENCE_KEY: &[&str] = &["user_id"];

pub struct PreferenceRepo;

impl PreferenceRepo {
    pub async fn find(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Option<UserPreferences>, ClientError> {
        fetch_optional(store, USER_PREFERENCES, &Query::new().eq("user_id", user_id)).await
    }

    /// Insert the default row unless one exists. Returns `None` when a row
    /// was already there.
    pub async fn create_default(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Option<UserPreferences>, ClientError> {
        let mut row = UserPreferences::defaults(user_id);
        row.updated_at = Some(Utc::now());
        upsert_one(store, USER_PREFERENCES, &row, Upsert::ignore(PREFERENCE_KEY)).await
    }

    /// Save the full row, overwriting any existing one.
    pub async fn save(
        store: &dyn RemoteStore,
        prefs: &UserPreferences,
    ) -> Result<UserPreferences, ClientError> {
        let mut row = prefs.clone();
        row.updated_at = Some(Utc::now());
        upsert_one(store, USER_PREFERENCES, &row, Upsert::merge(PREFERENCE_KEY))
            .await?
            .ok_or(ClientError::NoRows)
    }
}
