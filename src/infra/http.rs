//! reqwest-backed implementation of the blog platform API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};

use lettore_api_types::{InteractionRequest, PostResponse};

use crate::application::api::{ApiError, BlogApi};
use crate::domain::types::{PostId, UserId};

use super::error::InfraError;

const API_KEY_HEADER: &str = "X-API-KEY";

const CHECK_LIKE_PATH: &str = "api/posts/check-like";
const LIKE_PATH: &str = "api/posts/like";
const UNLIKE_PATH: &str = "api/posts/unlike";
const VIEW_PATH: &str = "api/posts/view";
const POSTS_PATH: &str = "api/posts";

/// HTTP client for a blog platform deployment.
#[derive(Debug)]
pub struct HttpBlogApi {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl HttpBlogApi {
    pub fn new(
        site: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        let base = Url::parse(site)
            .and_then(|url| url.join("/"))
            .map_err(|err| {
                InfraError::configuration(format!("invalid site url `{site}`: {err}"))
            })?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build http client: {err}"))
            })?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("lettore/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(ApiError::from_transport)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&InteractionRequest>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path)?;
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: &InteractionRequest,
    ) -> Result<(), ApiError> {
        self.send(method, path, Some(body)).await.map(|_| ())
    }
}

fn interaction(user: UserId, post: PostId) -> InteractionRequest {
    InteractionRequest {
        user_id: user.0,
        post_id: post.0,
    }
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn check_like_status(&self, user: UserId, post: PostId) -> Result<bool, ApiError> {
        let response = self
            .send(Method::POST, CHECK_LIKE_PATH, Some(&interaction(user, post)))
            .await?;
        response.json::<bool>().await.map_err(ApiError::from_parse)
    }

    async fn like(&self, user: UserId, post: PostId) -> Result<(), ApiError> {
        self.send_unit(Method::POST, LIKE_PATH, &interaction(user, post))
            .await
    }

    async fn unlike(&self, user: UserId, post: PostId) -> Result<(), ApiError> {
        // The upstream API models unlike as a DELETE with a JSON body.
        self.send_unit(Method::DELETE, UNLIKE_PATH, &interaction(user, post))
            .await
    }

    async fn record_view(&self, user: UserId, post: PostId) -> Result<(), ApiError> {
        self.send_unit(Method::POST, VIEW_PATH, &interaction(user, post))
            .await
    }

    async fn fetch_post(&self, post: PostId) -> Result<PostResponse, ApiError> {
        let response = self
            .send(Method::GET, &format!("{POSTS_PATH}/{post}"), None)
            .await?;
        response
            .json::<PostResponse>()
            .await
            .map_err(ApiError::from_parse)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;

    use super::*;

    fn api(server: &MockServer) -> HttpBlogApi {
        HttpBlogApi::new(&server.base_url(), None, Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn check_like_status_posts_ids_and_parses_bool() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/api/posts/check-like")
                    .json_body(serde_json::json!({"userId": 7, "postId": 42}));
                then.status(200)
                    .header("content-type", "application/json")
                    .body("true");
            })
            .await;

        let liked = api(&server)
            .check_like_status(UserId(7), PostId(42))
            .await
            .expect("status answer");

        assert!(liked);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/posts/like");
                then.status(503);
            })
            .await;

        let err = api(&server)
            .like(UserId(7), PostId(42))
            .await
            .expect_err("should fail");

        assert!(matches!(err, ApiError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/posts/check-like");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("not-a-bool");
            })
            .await;

        let err = api(&server)
            .check_like_status(UserId(7), PostId(42))
            .await
            .expect_err("should fail");

        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn fetch_post_hits_the_post_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET").path("/api/posts/42");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "id": 42,
                        "title": "Hello",
                        "content": "Body",
                        "category": "GENERAL",
                        "authorUsername": "amara",
                        "views": 10,
                        "likes": 3,
                        "createdAt": "2026-01-05T09:30:00Z",
                        "updatedAt": "2026-01-05T09:30:00Z"
                    }));
            })
            .await;

        let post = api(&server).fetch_post(PostId(42)).await.expect("post");

        assert_eq!(post.id, 42);
        assert_eq!(post.likes, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_key_header_is_attached_when_configured() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/api/posts/view")
                    .header("X-API-KEY", "reader-key");
                then.status(200);
            })
            .await;

        HttpBlogApi::new(&server.base_url(), Some("reader-key".into()), Duration::from_secs(5))
            .expect("client")
            .record_view(UserId(7), PostId(42))
            .await
            .expect("recorded");

        mock.assert_async().await;
    }

    #[test]
    fn invalid_site_url_is_a_configuration_error() {
        let err = HttpBlogApi::new("not a url", None, Duration::from_secs(5))
            .expect_err("should fail");
        assert!(matches!(err, InfraError::Configuration { .. }));
    }
}
