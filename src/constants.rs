//! Shared constants used across the application.

/// User agent sent with every upstream request.
///
/// Reddit asks API clients to identify themselves with a descriptive agent.
pub const CLIENT_USER_AGENT: &str = "thread-archiver/0.1, Archives for Reddit Threads";

/// Origin used to make thread links that point back into Reddit absolute.
pub const REDDIT_ORIGIN: &str = "https://reddit.com";

/// Default ceiling on comment nesting stored per thread.
pub const DEFAULT_MAX_COMMENT_DEPTH: usize = 100;

/// Number of threads shown on the index page.
pub const LATEST_THREADS_LIMIT: i64 = 10;

/// Page size for category listings.
pub const CATEGORY_PAGE_SIZE: i64 = 25;
