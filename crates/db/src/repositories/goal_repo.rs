//! Repository for the `goals` table.

use chrono::Utc;
use tymelyne_core::types::{DbId, UserId};
use tymelyne_remote::schema::GOALS;
use tymelyne_remote::store::{delete_rows, fetch_all, fetch_optional, insert_one, update_one};
use tymelyne_remote::{ClientError, Query, RemoteStore};

use crate::models::goal::{CreateGoal, Goal, UpdateGoal};
use crate::repositories::{stamped_patch, CompletedFlag};

pub struct GoalRepo;

impl GoalRepo {
    /// All goals of a user, newest first.
    pub async fn list_for_user(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Vec<Goal>, ClientError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_desc("created_at")
            .order_desc("id");
        fetch_all(store, GOALS, &query).await
    }

    pub async fn find_by_id(
        store: &dyn RemoteStore,
        user_id: UserId,
        id: DbId,
    ) -> Result<Option<Goal>, ClientError> {
        fetch_optional(store, GOALS, &Query::new().eq("id", id).eq("user_id", user_id)).await
    }

    pub async fn create(store: &dyn RemoteStore, input: &CreateGoal) -> Result<Goal, ClientError> {
        insert_one(store, GOALS, input).await
    }

    /// Update a goal. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no goal with the given `id` belongs to the user.
    pub async fn update(
        store: &dyn RemoteStore,
        user_id: UserId,
        id: DbId,
        input: &UpdateGoal,
    ) -> Result<Option<Goal>, ClientError> {
        let patch = stamped_patch(input, Utc::now())?;
        let query = Query::new().eq("id", id).eq("user_id", user_id);
        update_one(store, GOALS, &patch, &query).await
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(
        store: &dyn RemoteStore,
        user_id: UserId,
        id: DbId,
    ) -> Result<bool, ClientError> {
        let query = Query::new().eq("id", id).eq("user_id", user_id);
        Ok(delete_rows(store, GOALS, &query).await? > 0)
    }

    /// Completion flag of every goal of a user.
    pub async fn completion_flags(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Vec<bool>, ClientError> {
        let query = Query::new().columns("completed").eq("user_id", user_id);
        let rows: Vec<CompletedFlag> = fetch_all(store, GOALS, &query).await?;
        Ok(rows.into_iter().map(|r| r.completed).collect())
    }

    /// Number of goals, optionally restricted by completion.
    pub async fn count_for_user(
        store: &dyn RemoteStore,
        user_id: UserId,
        completed: Option<bool>,
    ) -> Result<u64, ClientError> {
        let mut query = Query::new().eq("user_id", user_id);
        if let Some(completed) = completed {
            query = query.eq("completed", completed);
        }
        store.count(GOALS, &query).await
    }
}
