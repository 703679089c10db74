//! Identifier newtypes and the like-status state shared across the client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Numeric identifier of a post, as issued by the blog platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

/// Numeric identifier of a user, as issued by the blog platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PostId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(PostId)
            .map_err(|_| DomainError::validation(format!("`{s}` is not a valid post id")))
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(UserId)
            .map_err(|_| DomainError::validation(format!("`{s}` is not a valid user id")))
    }
}

/// Whether the current viewer likes the current post.
///
/// `Unknown` means no cache entry exists and the server has not answered yet;
/// the state only moves to `Liked`/`NotLiked` after a successful server
/// round-trip or toggle mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeStatus {
    Unknown,
    Liked,
    NotLiked,
}

impl LikeStatus {
    /// Lift a cache lookup result into the tri-state.
    pub fn from_cached(flag: Option<bool>) -> Self {
        match flag {
            None => Self::Unknown,
            Some(true) => Self::Liked,
            Some(false) => Self::NotLiked,
        }
    }

    /// True only for `Liked`; `Unknown` renders as the default not-liked
    /// control state.
    pub fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }
}
