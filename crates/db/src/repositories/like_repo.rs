//! Repository for the `post_likes` table.

use std::collections::HashSet;

use serde::Deserialize;
use tymelyne_core::types::{DbId, UserId};
use tymelyne_remote::schema::POST_LIKES;
use tymelyne_remote::store::{delete_rows, fetch_all, upsert_one};
use tymelyne_remote::{ClientError, Query, RemoteStore, Upsert};

use crate::models::post::PostLike;

const LIKE_KEY: &[&str] = &["post_id", "user_id"];

#[derive(Deserialize)]
struct LikedPost {
    post_id: DbId,
}

pub struct LikeRepo;

impl LikeRepo {
    /// Which of `post_ids` the user has liked, in one round-trip.
    pub async fn liked_post_ids(
        store: &dyn RemoteStore,
        user_id: UserId,
        post_ids: &[DbId],
    ) -> Result<HashSet<DbId>, ClientError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let query = Query::new()
            .columns("post_id")
            .eq("user_id", user_id)
            .is_in("post_id", post_ids.iter().copied());
        let rows: Vec<LikedPost> = fetch_all(store, POST_LIKES, &query).await?;
        Ok(rows.into_iter().map(|r| r.post_id).collect())
    }

    /// Like a post. Returns `false` if the like already existed.
    pub async fn like(
        store: &dyn RemoteStore,
        post_id: DbId,
        user_id: UserId,
    ) -> Result<bool, ClientError> {
        let row = serde_json::json!({ "post_id": post_id, "user_id": user_id });
        let inserted: Option<PostLike> =
            upsert_one(store, POST_LIKES, &row, Upsert::ignore(LIKE_KEY)).await?;
        Ok(inserted.is_some())
    }

    /// Remove a like. Returns `false` if there was none.
    pub async fn unlike(
        store: &dyn RemoteStore,
        post_id: DbId,
        user_id: UserId,
    ) -> Result<bool, ClientError> {
        let query = Query::new().eq("post_id", post_id).eq("user_id", user_id);
        Ok(delete_rows(store, POST_LIKES, &query).await? > 0)
    }
}
