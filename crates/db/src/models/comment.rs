//! Comment rows.

use serde::{Deserialize, Serialize};
use tymelyne_core::types::{DbId, Timestamp, UserId};

/// A row from the `comments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: DbId,
    pub post_id: DbId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
}

/// DTO for adding a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CreateComment {
    pub post_id: DbId,
    pub user_id: UserId,
    pub content: String,
}
