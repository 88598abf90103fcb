//! Community feed rules: pagination, optimistic like commands, content
//! validation, and author display helpers.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Posts per feed page.
pub const FEED_PAGE_SIZE: u64 = 5;

/// Maximum length of a post or comment body.
pub const MAX_CONTENT_LENGTH: usize = 2000;

/// `(offset, limit)` for a zero-based feed page.
pub fn page_range(page: u64) -> (u64, u64) {
    (page.saturating_mul(FEED_PAGE_SIZE), FEED_PAGE_SIZE)
}

/// Validate a post or comment body.
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Content must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_CONTENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Content must be at most {MAX_CONTENT_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Optimistic like toggle
// ---------------------------------------------------------------------------

/// Viewer-local like state of one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

/// Remote mutation a like toggle requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    /// Create the viewer's like row.
    Insert,
    /// Remove the viewer's like row.
    Delete,
}

/// A like toggle captured as a command: `apply` mutates local state ahead of
/// the remote call, `compensate` restores the exact prior state if the call
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub post_id: DbId,
    before: LikeState,
}

impl LikeToggle {
    pub fn new(post_id: DbId, current: LikeState) -> Self {
        Self {
            post_id,
            before: current,
        }
    }

    /// The remote mutation to issue.
    pub fn action(&self) -> LikeAction {
        if self.before.liked {
            LikeAction::Delete
        } else {
            LikeAction::Insert
        }
    }

    /// State after the toggle succeeds.
    pub fn after(&self) -> LikeState {
        if self.before.liked {
            LikeState {
                liked: false,
                like_count: (self.before.like_count - 1).max(0),
            }
        } else {
            LikeState {
                liked: true,
                like_count: self.before.like_count + 1,
            }
        }
    }

    /// State when the remote row already matched the target: the flag
    /// flips but the count stays, since the count never included a change.
    pub fn already_current(&self) -> LikeState {
        LikeState {
            liked: !self.before.liked,
            like_count: self.before.like_count,
        }
    }

    pub fn apply(&self, state: &mut LikeState) {
        *state = self.after();
    }

    pub fn compensate(&self, state: &mut LikeState) {
        *state = self.before;
    }
}

// ---------------------------------------------------------------------------
// Author display
// ---------------------------------------------------------------------------

/// Display name for an author: "First Last", else the username, else
/// "Anonymous".
pub fn display_name(first: Option<&str>, last: Option<&str>, username: Option<&str>) -> String {
    let full = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !full.is_empty() {
        return full;
    }
    match username.map(str::trim) {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => "Anonymous".to_string(),
    }
}

/// Up to two uppercase initials of a display name ("Alex Chen" -> "AC").
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
