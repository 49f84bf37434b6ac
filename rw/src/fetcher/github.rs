//! GitHub releases API fetcher
//!
//! Calls `GET {base}/repos/{owner}/{name}/releases/latest`. GitHub answers
//! 404 when a repository has no published release.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::debug;

use super::{FetchError, ReleaseFetcher};
use crate::config::GithubConfig;
use crate::domain::{ReleaseDescriptor, TrackedProject};

const ACCEPT: &str = "application/vnd.github+json";

/// Release payload as returned by the API (only the fields we use)
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: Option<String>,
    name: Option<String>,
    published_at: Option<DateTime<Utc>>,
    html_url: Option<String>,
}

/// Error payload returned alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct GithubErrorBody {
    message: String,
}

/// GitHub REST API client
pub struct GithubFetcher {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    http: Client,
}

impl GithubFetcher {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, authenticated = token.is_some(), ?timeout, "GithubFetcher::new: called");

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("releasewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            token,
            timeout,
            http,
        })
    }

    /// Create a fetcher from configuration, reading the token from the environment
    pub fn from_config(config: &GithubConfig) -> Result<Self, FetchError> {
        Self::new(&config.base_url, config.token(), config.timeout())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn latest_release_url(&self, project: &TrackedProject) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.base_url, project.owner, project.name)
    }

    /// Client-side timeouts are reported as timeouts, not network failures
    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err)
        }
    }
}

#[async_trait]
impl ReleaseFetcher for GithubFetcher {
    async fn latest_release(&self, project: &TrackedProject) -> Result<ReleaseDescriptor, FetchError> {
        let url = self.latest_release_url(project);
        debug!(%url, "latest_release: called");

        let mut request = self.http.get(&url).header(header::ACCEPT, ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(project = %project.slug(), "latest_release: 404");
            return Err(FetchError::NotFound(project.slug()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(%status, "latest_release: API error");
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let release = parse_release(&body)?;
        debug!(tag = %release.tag, "latest_release: success");
        Ok(release)
    }
}

/// Turn a release payload into a descriptor
///
/// A missing or empty `tag_name` or `html_url` is an invalid response.
fn parse_release(body: &str) -> Result<ReleaseDescriptor, FetchError> {
    let raw: GithubRelease = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("malformed release payload: {}", e)))?;

    let tag = raw
        .tag_name
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| FetchError::InvalidResponse("release has no tag_name".to_string()))?;

    let url = raw
        .html_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| FetchError::InvalidResponse(format!("release {} has no html_url", tag)))?;

    Ok(ReleaseDescriptor {
        tag,
        name: raw.name,
        published_at: raw.published_at,
        url,
    })
}

/// Prefer the API's `message` field over the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<GithubErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project() -> TrackedProject {
        TrackedProject::new("CesiumGS", "cesium", "CesiumJS")
    }

    fn release_json(tag: &str) -> serde_json::Value {
        serde_json::json!({
            "tag_name": tag,
            "name": format!("CesiumJS {}", tag),
            "published_at": "2024-10-01T14:30:00Z",
            "html_url": format!("https://github.com/CesiumGS/cesium/releases/tag/{}", tag),
            "draft": false,
            "prerelease": false
        })
    }

    #[test]
    fn test_parse_release() {
        let release = parse_release(&release_json("1.122").to_string()).unwrap();
        assert_eq!(release.tag, "1.122");
        assert_eq!(release.name.as_deref(), Some("CesiumJS 1.122"));
        assert_eq!(release.published_at, Some("2024-10-01T14:30:00Z".parse().unwrap()));
        assert_eq!(release.url, "https://github.com/CesiumGS/cesium/releases/tag/1.122");
    }

    #[test]
    fn test_parse_release_null_name_and_date() {
        let body = r#"{"tag_name": "v1", "name": null, "published_at": null, "html_url": "https://x/v1"}"#;
        let release = parse_release(body).unwrap();
        assert_eq!(release.title(), "v1");
        assert!(release.published_at.is_none());
    }

    #[test]
    fn test_parse_release_missing_tag() {
        let body = r#"{"name": "Nightly", "html_url": "https://x/n"}"#;
        let err = parse_release(body).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));

        let body = r#"{"tag_name": "", "html_url": "https://x/n"}"#;
        assert!(parse_release(body).is_err());
    }

    #[test]
    fn test_parse_release_garbage() {
        assert!(matches!(parse_release("<html>"), Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message": "Bad credentials"}"#), "Bad credentials");
        assert_eq!(error_message("upstream down\n"), "upstream down");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let fetcher = GithubFetcher::new("https://api.github.com/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            fetcher.latest_release_url(&project()),
            "https://api.github.com/repos/CesiumGS/cesium/releases/latest"
        );
        assert!(!fetcher.is_authenticated());
    }

    #[tokio::test]
    async fn test_latest_release_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/CesiumGS/cesium/releases/latest"))
            .and(header_eq("authorization", "Bearer ghp_test"))
            .and(header_eq("accept", ACCEPT))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_json("1.122")))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = GithubFetcher::new(server.uri(), Some("ghp_test".to_string()), Duration::from_secs(5)).unwrap();
        let release = fetcher.latest_release(&project()).await.unwrap();
        assert_eq!(release.tag, "1.122");
    }

    #[tokio::test]
    async fn test_latest_release_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let fetcher = GithubFetcher::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        let err = fetcher.latest_release(&project()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_latest_release_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "Bad credentials"})))
            .mount(&server)
            .await;

        let fetcher = GithubFetcher::new(server.uri(), Some("bad".to_string()), Duration::from_secs(5)).unwrap();
        match fetcher.latest_release(&project()).await {
            Err(FetchError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_latest_release_slow_upstream_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(release_json("1.122"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = GithubFetcher::new(server.uri(), None, Duration::from_millis(200)).unwrap();
        match fetcher.latest_release(&project()).await {
            Err(FetchError::Timeout(after)) => assert_eq!(after, Duration::from_millis(200)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_latest_release_network_error() {
        // Nothing listens on this port once the listener is dropped
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let fetcher = GithubFetcher::new(uri, None, Duration::from_secs(5)).unwrap();
        let err = fetcher.latest_release(&project()).await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }
}
