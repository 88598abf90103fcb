//! Community feed: paged posts, optimistic likes, and comments.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tymelyne_core::community::{initials, validate_content, LikeAction, LikeState, LikeToggle};
use tymelyne_core::types::{DbId, UserId};
use tymelyne_db::models::comment::{Comment, CreateComment};
use tymelyne_db::models::post::{CreatePost, Post};
use tymelyne_db::models::profile::AuthorSummary;
use tymelyne_db::repositories::{CommentRepo, LikeRepo, PostRepo, ProfileRepo};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// A post as shown to the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPost {
    pub post: Post,
    pub author_name: String,
    pub author_initials: String,
    /// Viewer-local like flag and count. Diverges from `post.like_count`
    /// while a toggle is applied optimistically.
    pub like: LikeState,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author_name: String,
}

/// Result of a like toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The toggle was written; the post now has this state.
    Applied(LikeState),
    /// A toggle for the same post was still in flight; nothing was sent.
    Suppressed,
}

/// One viewer's feed. Holds the current page so likes and comments can
/// update it in place.
pub struct CommunityFeed {
    ctx: AppContext,
    viewer: UserId,
    page: tokio::sync::Mutex<u64>,
    posts: Mutex<Vec<FeedPost>>,
    in_flight: Mutex<HashSet<DbId>>,
}

impl CommunityFeed {
    pub fn new(ctx: AppContext, viewer: UserId) -> Self {
        Self {
            ctx,
            viewer,
            page: tokio::sync::Mutex::new(0),
            posts: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub async fn posts(&self) -> Vec<FeedPost> {
        self.posts_mut().clone()
    }

    pub async fn page(&self) -> u64 {
        *self.page.lock().await
    }

    /// Load a zero-based page. Liked flags and author names each come from
    /// one batched lookup over the page.
    pub async fn load_page(&self, page: u64) -> AppResult<Vec<FeedPost>> {
        let store = self.ctx.store();
        let rows = PostRepo::list_page(store, page)
            .await
            .map_err(AppError::fetch("the feed"))?;

        let post_ids: Vec<DbId> = rows.iter().map(|p| p.id).collect();
        let author_ids: Vec<UserId> = rows
            .iter()
            .map(|p| p.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let (liked, authors) = tokio::try_join!(
            LikeRepo::liked_post_ids(store, self.viewer, &post_ids),
            ProfileRepo::find_authors(store, &author_ids),
        )
        .map_err(AppError::fetch("the feed"))?;
        let names = author_names(authors);

        let posts: Vec<FeedPost> = rows
            .into_iter()
            .map(|post| {
                let author_name = names
                    .get(&post.user_id)
                    .cloned()
                    .unwrap_or_else(|| "Anonymous".to_string());
                FeedPost {
                    author_initials: initials(&author_name),
                    author_name,
                    like: LikeState {
                        liked: liked.contains(&post.id),
                        like_count: post.like_count,
                    },
                    comment_count: post.comment_count,
                    post,
                }
            })
            .collect();

        tracing::debug!(page, posts = posts.len(), "Feed page loaded");
        *self.page.lock().await = page;
        *self.posts_mut() = posts.clone();
        Ok(posts)
    }

    /// Re-fetch the current page.
    pub async fn reload(&self) -> AppResult<Vec<FeedPost>> {
        let page = self.page().await;
        self.load_page(page).await
    }

    /// Toggle the viewer's like on a loaded post.
    ///
    /// The new state is applied locally before the remote write and rolled
    /// back exactly if the write fails or the call is dropped before it
    /// settles. If the store already held the target state, the local count
    /// was stale and is left as it was.
    pub async fn toggle_like(&self, post_id: DbId) -> AppResult<ToggleOutcome> {
        if !self.in_flight().insert(post_id) {
            tracing::debug!(post_id, "Like toggle already in flight");
            return Ok(ToggleOutcome::Suppressed);
        }
        let mut pending = PendingToggle {
            feed: self,
            post_id,
            applied: None,
        };

        let toggle = {
            let mut posts = self.posts_mut();
            let entry = posts
                .iter_mut()
                .find(|p| p.post.id == post_id)
                .ok_or_else(|| AppError::not_found("post", post_id))?;
            let toggle = LikeToggle::new(post_id, entry.like);
            toggle.apply(&mut entry.like);
            toggle
        };
        pending.applied = Some(toggle);

        let store = self.ctx.store();
        let written = match toggle.action() {
            LikeAction::Insert => LikeRepo::like(store, post_id, self.viewer).await,
            LikeAction::Delete => LikeRepo::unlike(store, post_id, self.viewer).await,
        };

        match written {
            Ok(true) => {
                pending.settle();
                Ok(ToggleOutcome::Applied(toggle.after()))
            }
            Ok(false) => {
                tracing::debug!(post_id, "Like state was already current; correcting local count");
                let state = toggle.already_current();
                if let Some(entry) = self.posts_mut().iter_mut().find(|p| p.post.id == post_id) {
                    entry.like = state;
                }
                pending.settle();
                Ok(ToggleOutcome::Applied(state))
            }
            Err(e) => {
                // Dropping `pending` restores the prior state.
                tracing::warn!(post_id, error = %e, "Like toggle failed; rolling back");
                Err(AppError::mutation("update the like")(e))
            }
        }
    }

    /// Publish a post and put it at the top of the loaded page.
    pub async fn create_post(&self, content: &str) -> AppResult<FeedPost> {
        validate_content(content)?;
        let input = CreatePost {
            user_id: self.viewer,
            content: content.trim().to_string(),
        };
        let post = PostRepo::create(self.ctx.store(), &input)
            .await
            .map_err(AppError::mutation("publish the post"))?;

        let author_name = self.author_name(self.viewer).await;
        let entry = FeedPost {
            author_initials: initials(&author_name),
            author_name,
            like: LikeState {
                liked: false,
                like_count: post.like_count,
            },
            comment_count: post.comment_count,
            post,
        };
        tracing::info!(post_id = entry.post.id, "Post created");
        self.posts_mut().insert(0, entry.clone());
        Ok(entry)
    }

    /// Comments on a post, oldest first, with author names.
    pub async fn comments(&self, post_id: DbId) -> AppResult<Vec<CommentView>> {
        let store = self.ctx.store();
        let rows = CommentRepo::list_for_post(store, post_id)
            .await
            .map_err(AppError::fetch("comments"))?;
        let author_ids: Vec<UserId> = rows
            .iter()
            .map(|c| c.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names = match ProfileRepo::find_authors(store, &author_ids).await {
            Ok(authors) => author_names(authors),
            Err(e) => {
                tracing::warn!(post_id, error = %e, "Failed to load comment authors");
                HashMap::new()
            }
        };
        Ok(rows
            .into_iter()
            .map(|comment| CommentView {
                author_name: names
                    .get(&comment.user_id)
                    .cloned()
                    .unwrap_or_else(|| "Anonymous".to_string()),
                comment,
            })
            .collect())
    }

    /// Add a comment and bump the loaded post's comment count.
    pub async fn add_comment(&self, post_id: DbId, content: &str) -> AppResult<Comment> {
        validate_content(content)?;
        let input = CreateComment {
            post_id,
            user_id: self.viewer,
            content: content.trim().to_string(),
        };
        let comment = CommentRepo::create(self.ctx.store(), &input)
            .await
            .map_err(AppError::mutation("add the comment"))?;
        if let Some(entry) = self.posts_mut().iter_mut().find(|p| p.post.id == post_id) {
            entry.comment_count += 1;
        }
        Ok(comment)
    }

    fn posts_mut(&self) -> MutexGuard<'_, Vec<FeedPost>> {
        self.posts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<DbId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn author_name(&self, id: UserId) -> String {
        match ProfileRepo::find_authors(self.ctx.store(), &[id]).await {
            Ok(authors) => authors
                .first()
                .map(AuthorSummary::display_name)
                .unwrap_or_else(|| "Anonymous".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load author name");
                "Anonymous".to_string()
            }
        }
    }
}

/// Clears the in-flight mark when a toggle ends, however it ends, and rolls
/// the local state back unless the write was confirmed.
struct PendingToggle<'a> {
    feed: &'a CommunityFeed,
    post_id: DbId,
    applied: Option<LikeToggle>,
}

impl PendingToggle<'_> {
    fn settle(&mut self) {
        self.applied = None;
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if let Some(toggle) = self.applied.take() {
            if let Some(entry) = self
                .feed
                .posts_mut()
                .iter_mut()
                .find(|p| p.post.id == self.post_id)
            {
                toggle.compensate(&mut entry.like);
            }
        }
        self.feed.in_flight().remove(&self.post_id);
    }
}

fn author_names(authors: Vec<AuthorSummary>) -> HashMap<UserId, String> {
    authors
        .into_iter()
        .map(|a| (a.id, a.display_name()))
        .collect()
}
