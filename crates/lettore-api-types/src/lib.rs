//! Shared request and response types for the blog platform API.
//!
//! These are the wire shapes `lettore` exchanges with a blog server. The
//! upstream API speaks camelCase JSON with numeric identifiers; required
//! fields are enforced here so a malformed body fails at the deserialization
//! boundary instead of leaking partial state into the client.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Body for every interaction mutation (`like`, `unlike`, `check-like`,
/// `view`): the acting user and the target post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub user_id: u64,
    pub post_id: u64,
}

/// A single post as returned by `GET /api/posts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub category: String,
    /// Absent for posts whose author account was deleted.
    #[serde(default)]
    pub author_username: Option<String>,
    pub views: u64,
    pub likes: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PostResponse {
    /// True when the post was edited after publication.
    pub fn was_updated(&self) -> bool {
        self.updated_at != self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_BODY: &str = r#"{
        "id": 42,
        "title": "Hello",
        "content": "Body text",
        "category": "GENERAL",
        "authorUsername": "amara",
        "views": 10,
        "likes": 3,
        "createdAt": "2026-01-05T09:30:00Z",
        "updatedAt": "2026-01-05T09:30:00Z"
    }"#;

    #[test]
    fn post_response_parses_camel_case() {
        let post: PostResponse = serde_json::from_str(POST_BODY).expect("valid post body");
        assert_eq!(post.id, 42);
        assert_eq!(post.author_username.as_deref(), Some("amara"));
        assert_eq!(post.likes, 3);
        assert!(!post.was_updated());
    }

    #[test]
    fn post_response_rejects_missing_required_field() {
        let body = r#"{"id": 42, "title": "Hello"}"#;
        assert!(serde_json::from_str::<PostResponse>(body).is_err());
    }

    #[test]
    fn author_username_defaults_to_none() {
        let body = POST_BODY.replace("\"authorUsername\": \"amara\",", "");
        let post: PostResponse = serde_json::from_str(&body).expect("valid post body");
        assert!(post.author_username.is_none());
    }

    #[test]
    fn interaction_request_serializes_camel_case() {
        let request = InteractionRequest {
            user_id: 7,
            post_id: 42,
        };
        let value = serde_json::to_value(request).expect("serializable");
        assert_eq!(value["userId"], 7);
        assert_eq!(value["postId"], 42);
    }
}
