//! Validation of user-submitted thread URLs and identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

static CATEGORY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_]{1,20}$").unwrap());

static THREAD_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]{6,12}$").unwrap());

static COMMENT_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]{1,12}$").unwrap());

const ALLOWED_HOSTS: &[&str] = &[
    "reddit.com",
    "www.reddit.com",
    "old.reddit.com",
    "new.reddit.com",
    "np.reddit.com",
    "m.reddit.com",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not a valid URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported host: {0}")]
    UnsupportedHost(String),
    #[error("URL does not point to a thread")]
    NotAThread,
    #[error("invalid community name: {0}")]
    InvalidCategory(String),
    #[error("invalid thread id: {0}")]
    InvalidThreadId(String),
    #[error("invalid comment id: {0}")]
    InvalidCommentId(String),
}

/// Where a thread lives upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLocator {
    pub category: String,
    pub thread_id: String,
}

/// Parse a thread URL such as
/// `https://www.reddit.com/r/rust/comments/agi5zf/some_title/`.
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first problem found.
pub fn parse_thread_url(input: &str) -> Result<ThreadLocator, ValidationError> {
    let trimmed = input.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).map_err(|_| ValidationError::InvalidUrl(input.to_string()))?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !ALLOWED_HOSTS.contains(&host.as_str()) {
        return Err(ValidationError::UnsupportedHost(host));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["r", category, "comments", thread_id, ..] => Ok(ThreadLocator {
            category: validate_category(category)?.to_string(),
            thread_id: validate_thread_id(&thread_id.to_ascii_lowercase())?.to_string(),
        }),
        _ => Err(ValidationError::NotAThread),
    }
}

/// Check a community name.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCategory`] if the name is malformed.
pub fn validate_category(category: &str) -> Result<&str, ValidationError> {
    if CATEGORY_PATTERN.is_match(category) {
        Ok(category)
    } else {
        Err(ValidationError::InvalidCategory(category.to_string()))
    }
}

/// Check an external thread id.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidThreadId`] if the id is malformed.
pub fn validate_thread_id(thread_id: &str) -> Result<&str, ValidationError> {
    if THREAD_ID_PATTERN.is_match(thread_id) {
        Ok(thread_id)
    } else {
        Err(ValidationError::InvalidThreadId(thread_id.to_string()))
    }
}

/// Check an external comment id.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCommentId`] if the id is malformed.
pub fn validate_comment_id(comment_id: &str) -> Result<&str, ValidationError> {
    if COMMENT_ID_PATTERN.is_match(comment_id) {
        Ok(comment_id)
    } else {
        Err(ValidationError::InvalidCommentId(comment_id.to_string()))
    }
}
