//! Repository for the `tasks` table.

use chrono::Utc;
use tymelyne_core::goals::TaskFilter;
use tymelyne_core::types::{DbId, UserId};
use tymelyne_remote::schema::TASKS;
use tymelyne_remote::store::{delete_rows, fetch_all, fetch_optional, insert_one, update_one};
use tymelyne_remote::{ClientError, Query, RemoteStore};

use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::repositories::{stamped_patch, CompletedFlag};

pub struct TaskRepo;

impl TaskRepo {
    /// Tasks of a user, newest first, narrowed by completion and category.
    pub async fn list_for_user(
        store: &dyn RemoteStore,
        user_id: UserId,
        filter: TaskFilter,
        category: Option<&str>,
    ) -> Result<Vec<Task>, ClientError> {
        let mut query = Query::new().eq("user_id", user_id);
        if let Some(completed) = filter.completed() {
            query = query.eq("completed", completed);
        }
        if let Some(category) = category {
            query = query.eq("category", category);
        }
        let query = query.order_desc("created_at").order_desc("id");
        fetch_all(store, TASKS, &query).await
    }

    pub async fn find_by_id(
        store: &dyn RemoteStore,
        user_id: UserId,
        id: DbId,
    ) -> Result<Option<Task>, ClientError> {
        fetch_optional(store, TASKS, &Query::new().eq("id", id).eq("user_id", user_id)).await
    }

    pub async fn create(store: &dyn RemoteStore, input: &CreateTask) -> Result<Task, ClientError> {
        insert_one(store, TASKS, input).await
    }

    /// Returns `None` if no task with the given `id` belongs to the user.
    pub async fn update(
        store: &dyn RemoteStore,
        user_id: UserId,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, ClientError> {
        let patch = stamped_patch(input, Utc::now())?;
        let query = Query::new().eq("id", id).eq("user_id", user_id);
        update_one(store, TASKS, &patch, &query).await
    }

    pub async fn delete(
        store: &dyn RemoteStore,
        user_id: UserId,
        id: DbId,
    ) -> Result<bool, ClientError> {
        let query = Query::new().eq("id", id).eq("user_id", user_id);
        Ok(delete_rows(store, TASKS, &query).await? > 0)
    }

    pub async fn completion_flags(
        store: &dyn RemoteStore,
        user_id: UserId,
    ) -> Result<Vec<bool>, ClientError> {
        let query = Query::new().columns("completed").eq("user_id", user_id);
        let rows: Vec<CompletedFlag> = fetch_all(store, TASKS, &query).await?;
        Ok(rows.into_iter().map(|r| r.completed).collect())
    }

    pub async fn count_for_user(
        store: &dyn RemoteStore,
        user_id: UserId,
        completed: Option<bool>,
    ) -> Result<u64, ClientError> {
        let mut query = Query::new().eq("user_id", user_id);
        if let Some(completed) = completed {
            query = query.eq("completed", completed);
        }
        store.count(TASKS, &query).await
    }
}
