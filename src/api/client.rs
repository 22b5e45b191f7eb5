use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiErrorBody, SearchPage, SearchResponse};

const BASE_URL_VAR: &str = "MAGPIE_API_BASE";
const TOKEN_VAR: &str = "MAGPIE_API_TOKEN";
const SEARCH_PATH: &str = "api/search";
/// Results requested per page; the service may return fewer.
const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("MAGPIE_API_BASE not set. Point it at the search endpoint of your scraper service.")]
    BaseUrlNotSet,

    #[error("invalid MAGPIE_API_BASE: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("search API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction over the post-search service.
/// Implemented by `HttpSearchClient` for production; mock implementations used in tests.
pub trait SearchSource {
    async fn search_page(&self, query: &str, cursor: Option<&str>)
    -> Result<SearchPage, ApiError>;
}

#[derive(Clone)]
struct Token(String);

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone)]
pub struct HttpSearchClient {
    http: Client,
    base_url: String,
    token: Option<Token>,
}

impl HttpSearchClient {
    pub fn from_env(http: Client) -> Result<Self, ApiError> {
        let base = env::var(BASE_URL_VAR).map_err(|_| ApiError::BaseUrlNotSet)?;
        let base = base.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(ApiError::BaseUrlNotSet);
        }
        url::Url::parse(&base)?;
        let token = env::var(TOKEN_VAR)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Token);
        Ok(Self {
            http,
            base_url: base,
            token,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    async fn fetch_page(&self, query: &str, cursor: Option<&str>) -> Result<SearchPage, ApiError> {
        let url = format!("{}/{}", self.base_url, SEARCH_PATH);
        let limit = PAGE_SIZE.to_string();

        let mut request = self
            .http
            .get(&url)
            .header("User-Agent", crate::USER_AGENT)
            .query(&[("q", query), ("limit", limit.as_str())])
            .timeout(REQUEST_TIMEOUT);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(&token.0);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("search API rate limited");
            return Err(ApiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<SearchResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "search API error");
                return Err(classified);
            }
            let snippet = &text[..text.floor_char_boundary(200)];
            warn!(status = %status, "search API error (no structured body)");
            return Err(ApiError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: SearchResponse = response.json().await?;

        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "search API error in 200 response");
            return Err(classified);
        }

        let page = SearchPage {
            posts: body.posts.into_iter().map(Into::into).collect(),
            next_cursor: body.next_cursor,
        };
        debug!(
            posts = page.posts.len(),
            more = page.next_cursor.is_some(),
            "search page fetched"
        );
        Ok(page)
    }
}

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

impl SearchSource for HttpSearchClient {
    async fn search_page(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ApiError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.fetch_page(query, cursor).await {
                Ok(page) => return Ok(page),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < MAX_RETRIES {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying after transient error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(ApiError::RateLimited))
    }
}

fn is_retriable(e: &ApiError) -> bool {
    matches!(
        e,
        ApiError::RateLimited
            | ApiError::Api {
                code: 500..=599,
                ..
            }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}

fn classify_api_error(err: &ApiErrorBody) -> ApiError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => ApiError::RateLimited,
        Some(code) => ApiError::Api { code, message },
        None => ApiError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_429_as_rate_limited() {
        let err = ApiErrorBody {
            code: Some(429),
            message: Some("Resource exhausted".into()),
        };
        assert!(matches!(classify_api_error(&err), ApiError::RateLimited));
    }

    #[test]
    fn classify_503_as_generic_api_error() {
        let err = ApiErrorBody {
            code: Some(503),
            message: Some("scraper pool drained".into()),
        };
        match classify_api_error(&err) {
            ApiError::Api { code, message } => {
                assert_eq!(code, 503);
                assert_eq!(message, "scraper pool drained");
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn classify_missing_code_as_unknown() {
        let err = ApiErrorBody {
            code: None,
            message: None,
        };
        match classify_api_error(&err) {
            ApiError::Api { code, message } => {
                assert_eq!(code, 0);
                assert!(message.contains("no status code"));
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn rate_limited_and_server_errors_are_retriable() {
        assert!(is_retriable(&ApiError::RateLimited));
        assert!(is_retriable(&ApiError::Api {
            code: 502,
            message: "bad gateway".into(),
        }));
        assert!(!is_retriable(&ApiError::Api {
            code: 400,
            message: "bad query".into(),
        }));
        assert!(!is_retriable(&ApiError::BaseUrlNotSet));
    }
}
