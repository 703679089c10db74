//! Session cache key definitions.
//!
//! A `SessionKey` identifies one interaction flag; its string encoding is the
//! platform's session storage layout, so bulk operations work on the same key
//! space a browser client would leave behind.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::types::{PostId, UserId};

/// The two kinds of interaction flag kept per (post, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    /// The viewer's cached like-status for a post.
    Liked,
    /// Whether a view was already recorded for a post this session.
    Viewed,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Viewed => "viewed",
        }
    }
}

impl FromStr for FlagKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liked" => Ok(Self::Liked),
            "viewed" => Ok(Self::Viewed),
            other => Err(DomainError::validation(format!(
                "`{other}` is not a session flag kind"
            ))),
        }
    }
}

/// Composite key of one session cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub kind: FlagKind,
    pub post: PostId,
    pub user: UserId,
}

impl SessionKey {
    pub fn liked(post: PostId, user: UserId) -> Self {
        Self {
            kind: FlagKind::Liked,
            post,
            user,
        }
    }

    pub fn viewed(post: PostId, user: UserId) -> Self {
        Self {
            kind: FlagKind::Viewed,
            post,
            user,
        }
    }

    /// Storage encoding: `{kind}_post_{postId}_user_{userId}`.
    pub fn encode(&self) -> String {
        format!(
            "{}_post_{}_user_{}",
            self.kind.as_str(),
            self.post,
            self.user
        )
    }

    /// Parse a storage key back into its components.
    ///
    /// Bulk clears use this to decide which entries belong to a user; entries
    /// that do not parse are simply not ours to touch.
    pub fn parse(key: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::validation(format!("`{key}` is not a session cache key"));

        let (kind_str, rest) = key.split_once("_post_").ok_or_else(invalid)?;
        let kind = kind_str.parse::<FlagKind>().map_err(|_| invalid())?;
        let (post_str, user_str) = rest.split_once("_user_").ok_or_else(invalid)?;
        let post = post_str.parse::<PostId>().map_err(|_| invalid())?;
        let user = user_str.parse::<UserId>().map_err(|_| invalid())?;

        Ok(Self { kind, post, user })
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_matches_storage_layout() {
        let key = SessionKey::liked(PostId(42), UserId(7));
        assert_eq!(key.encode(), "liked_post_42_user_7");

        let key = SessionKey::viewed(PostId(1), UserId(99));
        assert_eq!(key.encode(), "viewed_post_1_user_99");
    }

    #[test]
    fn parse_round_trips() {
        let original = SessionKey::viewed(PostId(42), UserId(7));
        let parsed = SessionKey::parse(&original.encode()).expect("round trip");
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_rejects_foreign_keys() {
        assert!(SessionKey::parse("currentUser").is_err());
        assert!(SessionKey::parse("liked_post_42").is_err());
        assert!(SessionKey::parse("starred_post_42_user_7").is_err());
        assert!(SessionKey::parse("liked_post_x_user_7").is_err());
    }
}
