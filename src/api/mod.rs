pub mod follows;
pub mod service;
pub mod types;
pub mod users;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use service::UserService;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },
    #[error("API error (status {status}): {detail}")]
    ApiError { status: u16, detail: String },
    #[error("deserialization error: {0}")]
    Deserialize(String),
    #[error("no such user: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Thin client for the Twitch Helix API.
///
/// The OAuth token is passed per call; only the application's client id is
/// bound to the client itself.
pub struct HelixApiClient {
    http_client: reqwest::Client,
    client_id: String,
    base_url: String,
}

impl HelixApiClient {
    pub fn with_base_url(client_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            client_id: client_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build an authorized request for a Helix path.
    fn request(&self, method: Method, path: &str, oauth: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", bare_token(oauth)))
            .header("Client-Id", &self.client_id)
    }

    /// Issue a GET request and deserialize the JSON body.
    pub(crate) async fn helix_get<T: DeserializeOwned>(
        &self,
        path: &str,
        oauth: &str,
    ) -> Result<T, ApiClientError> {
        let resp = self.request(Method::GET, path, oauth).send().await?;
        let body = Self::checked_body(resp).await?;
        serde_json::from_str::<T>(&body)
            .map_err(|e| ApiClientError::Deserialize(format!("{e}: {body}")))
    }

    /// Issue a mutating request whose response body is ignored.
    pub(crate) async fn helix_send(
        &self,
        method: Method,
        path: &str,
        oauth: &str,
        json: Option<&serde_json::Value>,
    ) -> Result<(), ApiClientError> {
        let mut req = self.request(method, path, oauth);
        if let Some(body) = json {
            req = req.json(body);
        }
        let resp = req.send().await?;
        Self::checked_body(resp).await?;
        Ok(())
    }

    /// Check rate-limit and status, returning the raw body on success.
    async fn checked_body(resp: Response) -> Result<String, ApiClientError> {
        match classify(resp.status(), resp.headers()) {
            Some(ApiClientError::ApiError { status, .. }) => {
                let detail = resp.text().await.unwrap_or_default();
                Err(ApiClientError::ApiError { status, detail })
            }
            Some(err) => Err(err),
            None => Ok(resp.text().await?),
        }
    }

    /// Build a full API URL from a path (e.g. "/users?id=123").
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Map a response status to its error, if it is one.
///
/// `ApiError::detail` is left empty; the caller fills it from the body.
fn classify(status: StatusCode, headers: &HeaderMap) -> Option<ApiClientError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_at = rate_limit_reset(headers).unwrap_or_else(Utc::now);
        return Some(ApiClientError::RateLimited { reset_at });
    }

    (!status.is_success()).then(|| ApiClientError::ApiError {
        status: status.as_u16(),
        detail: String::new(),
    })
}

/// Unix timestamp in the `ratelimit-reset` header.
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get("ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// Strip an IRC-style `oauth:` prefix from a chat token.
pub fn bare_token(oauth: &str) -> &str {
    oauth.strip_prefix("oauth:").unwrap_or(oauth)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn reset_header(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-reset", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn success_status_is_not_an_error() {
        assert!(classify(StatusCode::OK, &HeaderMap::new()).is_none());
        assert!(classify(StatusCode::NO_CONTENT, &HeaderMap::new()).is_none());
    }

    #[test]
    fn failure_status_is_api_error() {
        let err = classify(StatusCode::NOT_FOUND, &HeaderMap::new());
        assert!(matches!(
            err,
            Some(ApiClientError::ApiError { status: 404, .. })
        ));
    }

    #[test]
    fn too_many_requests_uses_reset_header() {
        let err = classify(StatusCode::TOO_MANY_REQUESTS, &reset_header("1700000000"));
        let Some(ApiClientError::RateLimited { reset_at }) = err else {
            panic!("expected RateLimited, got {err:?}");
        };
        assert_eq!(reset_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn too_many_requests_without_usable_header_resets_now() {
        for headers in [HeaderMap::new(), reset_header("soon")] {
            let before = Utc::now();
            let err = classify(StatusCode::TOO_MANY_REQUESTS, &headers);
            let Some(ApiClientError::RateLimited { reset_at }) = err else {
                panic!("expected RateLimited, got {err:?}");
            };
            assert!(reset_at >= before && reset_at <= Utc::now());
        }
    }

    #[test]
    fn bare_token_strips_irc_prefix() {
        assert_eq!(bare_token("oauth:abc123"), "abc123");
        assert_eq!(bare_token("abc123"), "abc123");
    }

    #[test]
    fn url_joins_base_without_double_slash() {
        let client = HelixApiClient::with_base_url("cid", "http://localhost:8080/helix/");
        assert_eq!(
            client.url("/users?id=1"),
            "http://localhost:8080/helix/users?id=1"
        );
    }
}
