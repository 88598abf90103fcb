//! Lifetime of a view's in-flight requests.
//!
//! A [`ViewScope`] is created when a view mounts. Work started through it
//! is abandoned once the scope is cancelled or dropped, so responses that
//! arrive after the view is gone never update its state.

use std::future::Future;

use tokio_util::sync::{CancellationToken, DropGuard};

pub struct ViewScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// A scope that also ends when `parent` is cancelled.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self::from_token(parent.child_token())
    }

    fn from_token(token: CancellationToken) -> Self {
        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    /// Token for background listeners tied to this view.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the scope ends first. `None` means the result, if
    /// any, must be discarded.
    pub async fn run<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            value = fut => (!self.token.is_cancelled()).then_some(value),
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}
