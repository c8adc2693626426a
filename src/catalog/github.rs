//! GitHub tag listing with conditional-get support

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config;
use crate::error::TagSourceError;

#[cfg(test)]
use mockall::automock;

/// Source of tag names for the version catalog.
///
/// `since` carries the cache modification time; implementations are expected
/// to return an empty delta when nothing changed after that instant.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagSource: Send + Sync {
    async fn tags_since(&self, since: Option<SystemTime>) -> Result<Vec<String>, TagSourceError>;
}

/// A single entry of the tags payload; only the name is consumed.
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Lists tags of the k0s repository through the GitHub REST API.
///
/// Pagination follows the RFC 5988 `Link` header; a supplied `since` time is
/// sent as `If-Modified-Since` and a 304 reply short-circuits into an empty
/// delta.
pub struct GitHubTags {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubTags {
    /// Targets the base URL and token from the environment
    /// (`GITHUB_API_URL`, `GITHUB_TOKEN`).
    pub fn new() -> Result<Self, TagSourceError> {
        Self::with_base_url(config::github_api_url(), config::github_token())
    }

    /// Targets an explicit base URL, useful for tests and GitHub Enterprise.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, TagSourceError> {
        Ok(Self {
            client: config::http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait::async_trait]
impl TagSource for GitHubTags {
    async fn tags_since(&self, since: Option<SystemTime>) -> Result<Vec<String>, TagSourceError> {
        let since_header = since.map(http_date);
        let url = format!(
            "{}/repos/{}/{}/tags",
            self.base_url,
            config::REPO_OWNER,
            config::REPO_NAME
        );

        let mut tags = Vec::new();
        let mut page: u32 = 1;
        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[
                    ("per_page", config::TAGS_PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .header("Accept", "application/vnd.github+json");
            if let Some(header) = &since_header {
                request = request.header("If-Modified-Since", header);
            }
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::NOT_MODIFIED {
                debug!(page, "tag list not modified");
                return Ok(tags);
            }
            if status != StatusCode::OK {
                let url = response.url().to_string();
                let body = response.text().await.unwrap_or_default();
                warn!(%url, %status, "tag listing failed");
                return Err(TagSourceError::Status {
                    url,
                    status: status.as_u16(),
                    body: body.trim().to_string(),
                });
            }

            let has_next = response
                .headers()
                .get("link")
                .and_then(|value| value.to_str().ok())
                .is_some_and(has_next_page);

            let payload: Vec<Tag> = response.json().await?;
            if payload.is_empty() {
                break;
            }
            tags.extend(payload.into_iter().map(|tag| tag.name));

            if !has_next {
                break;
            }
            page += 1;
        }

        debug!(count = tags.len(), "fetched tags");
        Ok(tags)
    }
}

fn has_next_page(link_header: &str) -> bool {
    link_header
        .split(',')
        .any(|section| section.contains(r#"rel="next""#))
}

fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    #[tokio::test]
    async fn fetches_tag_names_with_protocol_headers() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .match_header("Accept", "application/vnd.github+json")
            .match_header("User-Agent", config::USER_AGENT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name":"v1.2.0"},{"name":"v1.1.0"}]"#)
            .create_async()
            .await;

        let source = GitHubTags::with_base_url(server.url(), None).unwrap();
        let tags = source.tags_since(None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tags, ["v1.2.0", "v1.1.0"]);
    }

    #[tokio::test]
    async fn sends_if_modified_since_in_http_date_form() {
        let mut server = Server::new_async().await;

        let since = SystemTime::UNIX_EPOCH + Duration::from_secs(1_704_067_200); // 2024-01-01
        let mock = server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::Any)
            .match_header("If-Modified-Since", "Mon, 01 Jan 2024 00:00:00 GMT")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let source = GitHubTags::with_base_url(server.url(), None).unwrap();
        let tags = source.tags_since(Some(since)).await.unwrap();

        mock.assert_async().await;
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn treats_304_as_an_empty_delta() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::Any)
            .with_status(304)
            .create_async()
            .await;

        let source = GitHubTags::with_base_url(server.url(), None).unwrap();
        let tags = source
            .tags_since(Some(SystemTime::UNIX_EPOCH))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn follows_the_link_header_for_more_pages() {
        let mut server = Server::new_async().await;

        let next = format!(
            "<{}/repos/k0sproject/k0s/tags?per_page=100&page=2>; rel=\"next\"",
            server.url()
        );
        let first = server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("link", &next)
            .with_body(r#"[{"name":"v1.2.0"}]"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name":"v1.1.0"}]"#)
            .create_async()
            .await;

        let source = GitHubTags::with_base_url(server.url(), None).unwrap();
        let tags = source.tags_since(None).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(tags, ["v1.2.0", "v1.1.0"]);
    }

    #[tokio::test]
    async fn attaches_the_bearer_token_when_configured() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::Any)
            .match_header("Authorization", "Bearer secret-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let source =
            GitHubTags::with_base_url(server.url(), Some("secret-token".to_string())).unwrap();
        source.tags_since(None).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_error_statuses_with_the_body() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/repos/k0sproject/k0s/tags")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let source = GitHubTags::with_base_url(server.url(), None).unwrap();
        let err = source.tags_since(None).await.unwrap_err();

        match err {
            TagSourceError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn link_header_detection() {
        assert!(has_next_page(
            r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=9>; rel="last""#
        ));
        assert!(!has_next_page(
            r#"<https://api.github.com/x?page=1>; rel="prev""#
        ));
        assert!(!has_next_page(""));
    }
}
