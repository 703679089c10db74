//! The blog platform API surface the client consumes.
//!
//! The trait keeps the application layer independent of the HTTP stack; the
//! reqwest-backed implementation lives in `infra::http`.

use async_trait::async_trait;
use thiserror::Error;

use lettore_api_types::PostResponse;

use crate::domain::types::{PostId, UserId};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned status {status}")]
    Status { status: u16 },
    #[error("failed to parse response body: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn from_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn from_parse(err: impl std::fmt::Display) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Remote operations against the blog platform.
///
/// The like/unlike mutations carry intent: the client only issues `like` when
/// its cached state says not-liked, and vice versa. `record_view` is called
/// at most once per (user, post, session); global idempotence across cleared
/// sessions is the server's problem, not ours.
#[async_trait]
pub trait BlogApi: Send + Sync {
    /// Whether `user` currently likes `post`.
    async fn check_like_status(&self, user: UserId, post: PostId) -> Result<bool, ApiError>;

    async fn like(&self, user: UserId, post: PostId) -> Result<(), ApiError>;

    async fn unlike(&self, user: UserId, post: PostId) -> Result<(), ApiError>;

    /// Increment the server-side view counter for `post`.
    async fn record_view(&self, user: UserId, post: PostId) -> Result<(), ApiError>;

    /// Fetch a post for display, including its current like and view counts.
    async fn fetch_post(&self, post: PostId) -> Result<PostResponse, ApiError>;
}
