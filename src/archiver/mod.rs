//! Thread archiving: version check, the write transaction, and reading
//! archived threads back as trees.

mod ingest;
pub mod listing;
pub mod reconstruct;

pub use listing::{CommentNode, RootFields, ThreadListing};
pub use reconstruct::{reconstruct, RenderedComment, RenderedThread};

use std::sync::Arc;

use anyhow::Context;
use sqlx::SqliteConnection;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::db::{self, Database};
use crate::reddit::{validate_category, ContentFetcher};
use ingest::IngestRun;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid thread: {0}")]
    Validation(String),
    #[error("thread is already archived ({stored} stored replies, {fetched} fetched)")]
    AlreadyArchived { stored: i64, fetched: i64 },
    #[error("archival failed: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// What the write transaction will do with the root thread row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDecision {
    /// No archive of this thread exists yet.
    Insert,
    /// An older archive with fewer replies exists and will be refreshed.
    Upsert,
}

/// Summary of a committed archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub thread_key: i64,
    pub comments_written: usize,
    pub continuations: usize,
    pub truncated_branches: usize,
    pub skipped_continuations: usize,
}

/// Handle to an archive running in the background.
///
/// Dropping the ticket leaves the task running.
#[derive(Debug)]
pub struct ArchiveTicket {
    pub thread_id: String,
    pub decision: VersionDecision,
    handle: JoinHandle<Result<ArchiveOutcome, ArchiveError>>,
}

impl ArchiveTicket {
    /// Wait for the archive to commit or roll back.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the transaction,
    /// [`ArchiveError::AlreadyArchived`] if another archive of the thread
    /// committed at least as many replies first, or [`ArchiveError::Task`] if
    /// the task panicked.
    pub async fn wait(self) -> Result<ArchiveOutcome, ArchiveError> {
        self.handle.await?
    }
}

/// Writes fetched threads to the database.
pub struct Archiver {
    db: Database,
    fetcher: Arc<dyn ContentFetcher>,
    max_depth: usize,
}

impl Archiver {
    #[must_use]
    pub fn new(db: Database, fetcher: Arc<dyn ContentFetcher>, max_depth: usize) -> Self {
        Self {
            db,
            fetcher,
            max_depth,
        }
    }

    /// Compare a freshly fetched thread against what is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::AlreadyArchived`] when the stored root archive
    /// has at least as many replies as the fetched one.
    pub async fn check_version(&self, root: &RootFields) -> Result<VersionDecision, ArchiveError> {
        match db::get_root_reply_count(self.db.pool(), &root.id).await? {
            Some(stored) if stored >= root.reply_count => Err(ArchiveError::AlreadyArchived {
                stored,
                fetched: root.reply_count,
            }),
            Some(_) => Ok(VersionDecision::Upsert),
            None => Ok(VersionDecision::Insert),
        }
    }

    /// Archive a raw thread listing fetched from `category`.
    ///
    /// The version check runs before this returns; the write itself runs on a
    /// background task reachable through the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Validation`] for a payload without a thread,
    /// [`ArchiveError::AlreadyArchived`] when nothing newer was fetched, or a
    /// storage error from the version check.
    pub async fn archive(&self, category: &str, raw: &[u8]) -> Result<ArchiveTicket, ArchiveError> {
        validate_category(category).map_err(|e| ArchiveError::Validation(e.to_string()))?;

        let listing = ThreadListing::parse_to_depth(raw, self.max_depth);
        let thread_id = listing.root_fields().id.clone();
        if thread_id.is_empty() {
            return Err(ArchiveError::Validation(
                "payload does not contain a thread".to_string(),
            ));
        }

        let decision = self.check_version(listing.root_fields()).await?;
        info!(
            thread_id = %thread_id,
            category,
            decision = ?decision,
            "Dispatching archive"
        );

        let run = IngestRun::new(
            Arc::clone(&self.fetcher),
            category.to_string(),
            self.max_depth,
            chrono::Utc::now().timestamp(),
        );
        let handle = tokio::spawn(write_thread(self.db.clone(), run, listing));

        Ok(ArchiveTicket {
            thread_id,
            decision,
            handle,
        })
    }
}

/// Repeat the version check on the writer connection, where archives are
/// serialized, so a decision made on a stale read cannot replace a newer root.
async fn guard_version(
    conn: &mut SqliteConnection,
    root: &RootFields,
) -> Result<(), ArchiveError> {
    match db::get_root_reply_count(&mut *conn, &root.id).await? {
        Some(stored) if stored >= root.reply_count => Err(ArchiveError::AlreadyArchived {
            stored,
            fetched: root.reply_count,
        }),
        _ => Ok(()),
    }
}

async fn write_thread(
    db: Database,
    mut run: IngestRun,
    listing: ThreadListing,
) -> Result<ArchiveOutcome, ArchiveError> {
    let thread_id = listing.root_fields().id.clone();
    let mut tx = db
        .writer()
        .begin()
        .await
        .context("Failed to begin archive transaction")?;

    let written = match guard_version(&mut *tx, listing.root_fields()).await {
        Ok(()) => run.post_thread(&mut *tx, &listing, "").await,
        Err(e) => Err(e),
    };

    let thread_key = match written {
        Ok(key) => key,
        Err(e) => {
            if let ArchiveError::AlreadyArchived { stored, fetched } = &e {
                info!(
                    thread_id = %thread_id,
                    stored,
                    fetched,
                    "A newer archive committed first, discarding"
                );
            } else {
                error!(thread_id = %thread_id, "Archive failed, rolling back: {e:#}");
            }
            if let Err(rollback) = tx.rollback().await {
                error!(thread_id = %thread_id, "Failed to roll back archive: {rollback}");
            }
            return Err(e);
        }
    };

    if let Err(e) = tx.commit().await {
        error!(thread_id = %thread_id, "Failed to commit archive: {e}");
        return Err(anyhow::Error::new(e)
            .context("Failed to commit archive transaction")
            .into());
    }

    let outcome = run.finish(thread_key);
    info!(
        thread_id = %thread_id,
        thread_key,
        comments = outcome.comments_written,
        continuations = outcome.continuations,
        truncated = outcome.truncated_branches,
        skipped = outcome.skipped_continuations,
        "Archived thread"
    );
    Ok(outcome)
}
