//! Repository for the `challenges` and `user_challenges` tables.

use tymelyne_core::types::{DbId, UserId};
use tymelyne_remote::schema::{CHALLENGES, USER_CHALLENGES};
use tymelyne_remote::store::{
    delete_rows, fetch_all, fetch_optional, insert_one, update_one, upsert_one,
};
use tymelyne_remote::{ClientError, Query, RemoteStore, Upsert};

use crate::models::challenge::{Challenge, CreateChallenge, CreateParticipation, Participation};

const PARTICIPATION_KEY: &[&str] = &["challenge_id", "user_id"];

pub struct ChallengeRepo;

impl ChallengeRepo {
    /// All challenges, soonest start first.
    pub async fn list(store: &dyn RemoteStore) -> Result<Vec<Challenge>, ClientError> {
        let query = Query::new().order_asc("start_date").order_asc("id");
        fetch_all(store, CHALLENGES, &query).await
    }

    pub async fn find_by_id(
        store: &dyn RemoteStore,
        id: DbId,
    ) -> Result<Option<Challenge>, ClientError> {
        fetch_optional(store, CHALLENGES, &Query::new().eq("id", id)).await
    }

    pub async fn create(
        store: &dyn RemoteStore,
        input: &CreateChallenge,
    ) -> Result<Challenge, ClientError> {
        insert_one(store, CHALLENGES, input).await
    }
}

pub struct ParticipationRepo;

impl ParticipationRepo {
    pub async fn list_for_user(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Vec<Participation>, ClientError> {
        fetch_all(store, USER_CHALLENGES, &Query::new().eq("user_id", user_id)).await
    }

    pub async fn find(
        store: &dyn RemoteStore,
        challenge_id: DbId,
        user_id: UserId,
    ) -> Result<Option<Participation>, ClientError> {
        let query = Query::new()
            .eq("challenge_id", challenge_id)
            .eq("user_id", user_id);
        fetch_optional(store, USER_CHALLENGES, &query).await
    }

    /// Join a challenge. Returns `None` if already joined.
    pub async fn join(
        store: &dyn RemoteStore,
        challenge_id: DbId,
        user_id: UserId,
    ) -> Result<Option<Participation>, ClientError> {
        let input = CreateParticipation {
            challenge_id,
            user_id,
            progress: 0,
        };
        upsert_one(store, USER_CHALLENGES, &input, Upsert::ignore(PARTICIPATION_KEY)).await
    }

    /// Returns `true` if a participation row was removed.
    pub async fn leave(
        store: &dyn RemoteStore,
        challenge_id: DbId,
        user_id: UserId,
    ) -> Result<bool, ClientError> {
        let query = Query::new()
            .eq("challenge_id", challenge_id)
            .eq("user_id", user_id);
        Ok(delete_rows(store, USER_CHALLENGES, &query).await? > 0)
    }

    /// Store an already clamped progress value. `None` if not joined.
    pub async fn set_progress(
        store: &dyn RemoteStore,
        challenge_id: DbId,
        user_id: UserId,
        progress: i32,
    ) -> Result<Option<Participation>, ClientError> {
        let query = Query::new()
            .eq("challenge_id", challenge_id)
            .eq("user_id", user_id);
        let patch = serde_json::json!({ "progress": progress });
        update_one(store, USER_CHALLENGES, &patch, &query).await
    }
}
