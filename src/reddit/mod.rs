//! Reddit API client.
//!
//! Authenticates as a "script" application with the password grant and
//! fetches thread listings as raw JSON bytes.

mod locator;

pub use locator::{
    parse_thread_url, validate_category, validate_comment_id, validate_thread_id, ThreadLocator,
    ValidationError,
};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{Config, RedditCredentials};
use crate::constants::CLIENT_USER_AGENT;

/// Tokens are renewed this long before Reddit would reject them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("received unsuccessful response from upstream (status {status})")]
    Status { status: u16 },
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to obtain API token: {0}")]
    Token(String),
}

impl FetchError {
    /// HTTP status to report to our own caller for this failure.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Request(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Request(_) | Self::Token(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Source of raw thread listings.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the listing of a thread, or of the subtree rooted at
    /// `comment_id` when given.
    async fn fetch(
        &self,
        category: &str,
        thread_id: &str,
        comment_id: Option<&str>,
    ) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at
            .map_or(true, |at| Instant::now() + TOKEN_EXPIRY_MARGIN < at)
    }
}

/// Authenticated Reddit API client.
#[derive(Debug)]
pub struct RedditClient {
    client: Client,
    api_base: String,
    token_url: String,
    credentials: RedditCredentials,
    token: RwLock<Option<AccessToken>>,
}

impl RedditClient {
    /// Build a client and obtain the first access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the token
    /// request fails.
    pub async fn connect(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.client_timeout)
            .user_agent(CLIENT_USER_AGENT)
            .build()?;

        let reddit = Self {
            client,
            api_base: config.reddit_api_base.trim_end_matches('/').to_string(),
            token_url: config.reddit_token_url.clone(),
            credentials: config.reddit.clone(),
            token: RwLock::new(None),
        };
        let token = reddit.request_token().await?;
        *reddit.token.write().await = Some(token);
        info!("Successfully fetched new API token");

        Ok(reddit)
    }

    async fn request_token(&self) -> Result<AccessToken, FetchError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.app_id, Some(&self.credentials.app_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Token(format!("token endpoint returned {status}")));
        }

        let body: TokenResponse = response.json().await?;
        if body.access_token.is_empty() {
            return Err(FetchError::Token("response carried no access token".to_string()));
        }

        Ok(AccessToken {
            value: body.access_token,
            expires_at: body
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }

    async fn bearer_token(&self) -> Result<String, FetchError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another request may have refreshed while this one waited.
        if let Some(token) = slot.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }
        debug!("API token expired, refreshing");
        let token = self.request_token().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    fn thread_url(&self, category: &str, thread_id: &str, comment_id: Option<&str>) -> String {
        let mut url = format!(
            "{}/r/{}/comments/{}",
            self.api_base,
            urlencoding::encode(category),
            urlencoding::encode(thread_id)
        );
        if let Some(comment_id) = comment_id {
            url.push_str("/_/");
            url.push_str(&urlencoding::encode(comment_id));
        }
        url.push_str(".json");
        url
    }
}

#[async_trait]
impl ContentFetcher for RedditClient {
    async fn fetch(
        &self,
        category: &str,
        thread_id: &str,
        comment_id: Option<&str>,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.thread_url(category, thread_id, comment_id);
        let token = self.bearer_token().await?;

        debug!(url = %url, "Fetching thread listing");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, format!("bearer {token}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Bad response from upstream");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            FetchError::Status { status: 404 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FetchError::Token("nope".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_token_freshness() {
        let fresh = AccessToken {
            value: "t".to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(3600)),
        };
        assert!(fresh.is_fresh());

        let stale = AccessToken {
            value: "t".to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(10)),
        };
        assert!(!stale.is_fresh());

        let unbounded = AccessToken {
            value: "t".to_string(),
            expires_at: None,
        };
        assert!(unbounded.is_fresh());
    }
}
