//! Repository for the `comments` table.

use tymelyne_core::types::DbId;
use tymelyne_remote::schema::COMMENTS;
use tymelyne_remote::store::{fetch_all, insert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore};

use crate::models::comment::{Comment, CreateComment};

pub struct CommentRepo;

impl CommentRepo {
    /// Comments on a post, oldest first.
    pub async fn list_for_post(
        store: &dyn RemoteStore,
        post_id: DbId,
    ) -> Result<Vec<Comment>, ClientError> {
        let query = Query::new()
            .eq("post_id", post_id)
            .order_asc("created_at")
            .order_asc("id");
        fetch_all(store, COMMENTS, &query).await
    }

    pub async fn create(
        store: &dyn RemoteStore,
        input: &CreateComment,
    ) -> Result<Comment, ClientError> {
        insert_one(store, COMMENTS, input).await
    }
}
