//! Community posts and likes.

use serde::{Deserialize, Serialize};
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `posts` table.
///
/// `like_count` and `comment_count` are maintained by the hosted database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: DbId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
}

/// DTO for creating a post.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePost {
    pub user_id: UserId,
    pub content: String,
}

/// A row from the `post_likes` table. Existence means liked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLike {
    pub post_id: DbId,
    pub user_id: UserId,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}
