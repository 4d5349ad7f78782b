//! Recursive ingestion of a parsed listing into the open archive transaction.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use super::listing::{children, is_link_only, is_load_more, CommentNode, ThreadListing};
use super::{ArchiveError, ArchiveOutcome};
use crate::db::{self, NewComment, NewThread};
use crate::reddit::{validate_comment_id, ContentFetcher};

/// State of one archival run: everything written by a root thread and the
/// continuations it pulls in.
pub(crate) struct IngestRun {
    fetcher: Arc<dyn ContentFetcher>,
    category: String,
    max_depth: usize,
    archive_timestamp: i64,
    continued: HashSet<String>,
    outcome: ArchiveOutcome,
}

impl IngestRun {
    pub(crate) fn new(
        fetcher: Arc<dyn ContentFetcher>,
        category: String,
        max_depth: usize,
        archive_timestamp: i64,
    ) -> Self {
        Self {
            fetcher,
            category,
            max_depth,
            archive_timestamp,
            continued: HashSet::new(),
            outcome: ArchiveOutcome::default(),
        }
    }

    pub(crate) fn finish(self, thread_key: i64) -> ArchiveOutcome {
        ArchiveOutcome {
            thread_key,
            ..self.outcome
        }
    }

    /// Write the thread row for `listing` and all of its comments.
    ///
    /// `continuing_reply` is empty for the root archive and holds the
    /// originating comment id for a continuation.
    pub(crate) fn post_thread<'a>(
        &'a mut self,
        conn: &'a mut SqliteConnection,
        listing: &'a ThreadListing,
        continuing_reply: &'a str,
    ) -> BoxFuture<'a, Result<i64, ArchiveError>> {
        Box::pin(async move {
            let root = listing.root_fields();
            let thread = NewThread {
                thread_id: root.id.clone(),
                continuing_reply: continuing_reply.to_string(),
                replies_num: root.reply_count,
                sub: self.category.clone(),
                title: root.title.clone(),
                content: root.body.clone(),
                content_link: root.body_link.clone(),
                author: root.author.clone(),
                timestamp: root.created,
                archive_timestamp: self.archive_timestamp,
            };
            let thread_key = db::upsert_thread(conn, &thread).await?;
            debug!(
                thread_id = %root.id,
                continuing_reply,
                thread_key,
                "Stored thread row"
            );

            for node in listing.comments() {
                self.post_comment(conn, node, &root.id, thread_key, None, 0)
                    .await?;
            }

            Ok(thread_key)
        })
    }

    fn post_comment<'a>(
        &'a mut self,
        conn: &'a mut SqliteConnection,
        node: &'a CommentNode,
        thread_id: &'a str,
        thread_key: i64,
        parent_id: Option<i64>,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), ArchiveError>> {
        Box::pin(async move {
            if depth >= self.max_depth {
                debug!(thread_id, depth, "Comment depth limit reached, truncating");
                self.outcome.truncated_branches += 1;
                return Ok(());
            }
            if is_link_only(node) {
                return Ok(());
            }

            let load_more = is_load_more(node);
            let comment = NewComment {
                comment_id: node.id.clone(),
                content: node.body.clone(),
                author: node.author.clone(),
                thread_key,
                parent_id,
                timestamp: node.created,
                continues: load_more,
                score: node.score,
            };
            let key = db::upsert_comment(conn, &comment).await?;
            self.outcome.comments_written += 1;

            if load_more {
                if let Some(comment_id) = node.id.as_deref() {
                    self.continue_from(conn, thread_id, comment_id).await?;
                }
                return Ok(());
            }

            for child in children(node) {
                self.post_comment(conn, child, thread_id, thread_key, Some(key), depth + 1)
                    .await?;
            }
            Ok(())
        })
    }

    /// Fetch the replies cut off below `comment_id` and archive them as a
    /// continuation thread. Upstream failures only skip this branch.
    async fn continue_from(
        &mut self,
        conn: &mut SqliteConnection,
        thread_id: &str,
        comment_id: &str,
    ) -> Result<(), ArchiveError> {
        if validate_comment_id(comment_id).is_err() {
            warn!(thread_id, comment_id, "Invalid continuation comment id, skipping");
            self.outcome.skipped_continuations += 1;
            return Ok(());
        }
        if !self.continued.insert(comment_id.to_string()) {
            debug!(thread_id, comment_id, "Continuation already archived in this run");
            return Ok(());
        }

        let bytes = match self
            .fetcher
            .fetch(&self.category, thread_id, Some(comment_id))
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(thread_id, comment_id, error = %e, "Failed to fetch continuation, skipping");
                self.outcome.skipped_continuations += 1;
                return Ok(());
            }
        };

        let listing = ThreadListing::parse_to_depth(&bytes, self.max_depth);
        if listing.root_fields().id.is_empty() {
            warn!(thread_id, comment_id, "Continuation payload has no thread, skipping");
            self.outcome.skipped_continuations += 1;
            return Ok(());
        }

        self.post_thread(conn, &listing, comment_id).await?;
        self.outcome.continuations += 1;
        Ok(())
    }
}
