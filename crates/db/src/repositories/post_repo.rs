//! Repository for the `posts` table.

use tymelyne_core::community::page_range;
use tymelyne_core::types::DbId;
use tymelyne_remote::schema::POSTS;
use tymelyne_remote::store::{fetch_all, fetch_optional, insert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore};

use crate::models::post::{CreatePost, Post};

pub struct PostRepo;

impl PostRepo {
    /// One zero-based feed page, newest first.
    pub async fn list_page(store: &dyn RemoteStore, page: u64) -> Result<Vec<Post>, ClientError> {
        let (offset, limit) = page_range(page);
        let query = Query::new()
            .order_desc("created_at")
            .order_desc("id")
            .range(offset, limit);
        fetch_all(store, POSTS, &query).await
    }

    pub async fn find_by_id(store: &dyn RemoteStore, id: DbId) -> Result<Option<Post>, ClientError> {
        fetch_optional(store, POSTS, &Query::new().eq("id", id)).await
    }

    pub async fn create(store: &dyn RemoteStore, input: &CreatePost) -> Result<Post, ClientError> {
        insert_one(store, POSTS, input).await
    }
}
