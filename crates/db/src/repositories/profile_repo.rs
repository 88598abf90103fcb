//! Repository for the `profiles` table.

use chrono::Utc;
use tymelyne_core::types::UserId;
use tymelyne_remote::schema::PROFILES;
use tymelyne_remote::store::{fetch_all, fetch_optional, update_one, upsert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore, Upsert};

use crate::models::profile::{AuthorSummary, CreateProfile, Profile, UpdateProfile};
use crate::repositories::stamped_patch;

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, username";

pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn find_by_id(
        store: &dyn RemoteStore,
        id: UserId,
    ) -> Result<Option<Profile>, ClientError> {
        fetch_optional(store, PROFILES, &Query::new().eq("id", id)).await
    }

    pub async fn find_by_username(
        store: &dyn RemoteStore,
        username: &str,
    ) -> Result<Option<Profile>, ClientError> {
        fetch_optional(store, PROFILES, &Query::new().eq("username", username)).await
    }

    /// Display columns for a set of authors in one round-trip.
    pub async fn find_authors(
        store: &dyn RemoteStore,
        ids: &[UserId],
    ) -> Result<Vec<AuthorSummary>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .columns(AUTHOR_COLUMNS)
            .is_in("id", ids.iter().copied());
        fetch_all(store, PROFILES, &query).await
    }

    /// Write the sign-up profile row. A row created by a database trigger
    /// for the same user is merged rather than rejected.
    pub async fn create(
        store: &dyn RemoteStore,
        input: &CreateProfile,
    ) -> Result<Profile, ClientError> {
        upsert_one(store, PROFILES, input, Upsert::merge(&["id"]))
            .await?
            .ok_or(ClientError::NoRows)
    }

    /// Apply a profile edit. Returns `None` if the row does not exist.
    pub async fn update(
        store: &dyn RemoteStore,
        id: UserId,
        input: &UpdateProfile,
    ) -> Result<Option<Profile>, ClientError> {
        let patch = stamped_patch(input, Utc::now())?;
        update_one(store, PROFILES, &patch, &Query::new().eq("id", id)).await
    }

    /// Persist a new XP total and level together.
    pub async fn set_experience(
        store: &dyn RemoteStore,
        id: UserId,
        experience_points: i64,
        level: i32,
    ) -> Result<Option<Profile>, ClientError> {
        let patch = serde_json::json!({
            "experience_points": experience_points,
            "level": level,
            "updated_at": Utc::now(),
        });
        update_one(store, PROFILES, &patch, &Query::new().eq("id", id)).await
    }
}
