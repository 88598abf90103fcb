//! Repository for the `user_streaks` table.

use tymelyne_core::streaks::StreakType;
use tymelyne_core::types::UserId;
use tymelyne_remote::schema::USER_STREAKS;
use tymelyne_remote::store::{fetch_all, fetch_optional, upsert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore, Upsert};

use crate::models::streak::{UpsertStreak, UserStreak};

const STREAK_KEY: &[&str] = &["user_id", "streak_type"];

pub struct StreakRepo;

impl StreakRepo {
    pub async fn find(
        store: &dyn RemoteStore,
        user_id: UserId,
        kind: StreakType,
    ) -> Result<Option<UserStreak>, ClientError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("streak_type", kind.as_str());
        fetch_optional(store, USER_STREAKS, &query).await
    }

    pub async fn list_for_user(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Vec<UserStreak>, ClientError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_asc("streak_type");
        fetch_all(store, USER_STREAKS, &query).await
    }

    /// Insert or overwrite the row for `(user_id, streak_type)`.
    pub async fn upsert(
        store: &dyn RemoteStore,
        input: &UpsertStreak,
    ) -> Result<UserStreak, ClientError> {
        upsert_one(store, USER_STREAKS, input, Upsert::merge(STREAK_KEY))
            .await?
            .ok_or(ClientError::NoRows)
    }
}
