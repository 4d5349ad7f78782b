use serde::{Deserialize, Serialize};

/// An archived root post, or a continuation of one.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Thread {
    pub id: i64,
    pub thread_id: String,
    pub continuing_reply: String,
    pub replies_num: i64,
    pub sub: String,
    pub title: String,
    pub content: String,
    pub content_link: String,
    pub author: String,
    pub timestamp: i64,
    pub archive_timestamp: i64,
}

impl Thread {
    /// Whether this thread is the top-level archive rather than a continuation.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.continuing_reply.is_empty()
    }
}

/// Fields written when archiving a thread row.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub thread_id: String,
    pub continuing_reply: String,
    pub replies_num: i64,
    pub sub: String,
    pub title: String,
    pub content: String,
    pub content_link: String,
    pub author: String,
    pub timestamp: i64,
    pub archive_timestamp: i64,
}

/// One stored node of a reply tree.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub comment_id: Option<String>,
    pub content: String,
    pub author: String,
    pub thread_key: i64,
    pub parent_id: Option<i64>,
    pub timestamp: i64,
    pub continues: bool,
    pub score: i64,
}

/// Fields written when archiving a comment row.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub comment_id: Option<String>,
    pub content: String,
    pub author: String,
    pub thread_key: i64,
    pub parent_id: Option<i64>,
    pub timestamp: i64,
    pub continues: bool,
    pub score: i64,
}

/// A row of a thread listing (index page, category pages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThreadSummary {
    pub archive_timestamp: i64,
    pub thread_id: String,
    pub title: String,
    pub sub: String,
}
