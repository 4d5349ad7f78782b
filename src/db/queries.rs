use anyhow::{Context, Result};
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};

use super::models::{Comment, NewComment, NewThread, Thread, ThreadSummary};

// ========== Threads ==========

/// Get the reply count of the most recently archived root thread for an id.
///
/// Continuations are ignored; only the top-level archive decides whether a
/// fresh fetch is newer than what is stored. Runs on the read pool or inside
/// an open write transaction.
pub async fn get_root_reply_count<'e, E>(executor: E, thread_id: &str) -> Result<Option<i64>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<(i64,)> = sqlx::query_as(
        r"
        SELECT replies_num FROM threads
        WHERE thread_id = ? AND continuing_reply = ''
        ORDER BY archive_timestamp DESC
        LIMIT 1
        ",
    )
    .bind(thread_id)
    .fetch_optional(executor)
    .await
    .context("Failed to fetch stored reply count")?;

    Ok(row.map(|(count,)| count))
}

/// Get a thread by external id and continuation marker.
pub async fn get_thread(
    pool: &SqlitePool,
    thread_id: &str,
    continuing_reply: &str,
) -> Result<Option<Thread>> {
    sqlx::query_as(
        r"
        SELECT * FROM threads
        WHERE thread_id = ? AND continuing_reply = ?
        ORDER BY archive_timestamp DESC
        LIMIT 1
        ",
    )
    .bind(thread_id)
    .bind(continuing_reply)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch thread")
}

/// Get every continuation archived for a thread, oldest first.
pub async fn get_continuations(pool: &SqlitePool, thread_id: &str) -> Result<Vec<Thread>> {
    sqlx::query_as(
        r"
        SELECT * FROM threads
        WHERE thread_id = ? AND continuing_reply != ''
        ORDER BY id ASC
        ",
    )
    .bind(thread_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch thread continuations")
}

/// Insert a thread row, or refresh the existing row for the same
/// `(thread_id, continuing_reply)` pair. Returns the surrogate key, which is
/// stable across refreshes.
pub async fn upsert_thread(conn: &mut SqliteConnection, thread: &NewThread) -> Result<i64> {
    let row = sqlx::query(
        r"
        INSERT INTO threads (
            thread_id, continuing_reply, replies_num, sub, title,
            content, content_link, author, timestamp, archive_timestamp
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(thread_id, continuing_reply) DO UPDATE SET
            replies_num = excluded.replies_num,
            sub = excluded.sub,
            title = excluded.title,
            content = excluded.content,
            content_link = excluded.content_link,
            author = excluded.author,
            timestamp = excluded.timestamp,
            archive_timestamp = excluded.archive_timestamp
        RETURNING id
        ",
    )
    .bind(&thread.thread_id)
    .bind(&thread.continuing_reply)
    .bind(thread.replies_num)
    .bind(&thread.sub)
    .bind(&thread.title)
    .bind(&thread.content)
    .bind(&thread.content_link)
    .bind(&thread.author)
    .bind(thread.timestamp)
    .bind(thread.archive_timestamp)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to upsert thread")?;

    Ok(row.get::<i64, _>("id"))
}

/// Latest root threads, most recently archived first.
pub async fn list_latest(pool: &SqlitePool, limit: i64) -> Result<Vec<ThreadSummary>> {
    sqlx::query_as(
        r"
        SELECT archive_timestamp, thread_id, title, sub
        FROM threads
        WHERE continuing_reply = ''
        ORDER BY archive_timestamp DESC, id DESC
        LIMIT ?
        ",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch latest threads")
}

/// Root threads of one category, most recently archived first.
///
/// `page` is zero-based.
pub async fn list_by_category(
    pool: &SqlitePool,
    sub: &str,
    page: i64,
    page_size: i64,
) -> Result<Vec<ThreadSummary>> {
    sqlx::query_as(
        r"
        SELECT archive_timestamp, thread_id, title, sub
        FROM threads
        WHERE continuing_reply = '' AND sub = ?
        ORDER BY archive_timestamp DESC, id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(sub)
    .bind(page_size)
    .bind(page.max(0) * page_size)
    .fetch_all(pool)
    .await
    .context("Failed to fetch category threads")
}

/// Distinct categories with at least one archive, alphabetically.
pub async fn list_categories(pool: &SqlitePool, page: i64, page_size: i64) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r"
        SELECT DISTINCT sub
        FROM threads
        ORDER BY sub
        LIMIT ? OFFSET ?
        ",
    )
    .bind(page_size)
    .bind(page.max(0) * page_size)
    .fetch_all(pool)
    .await
    .context("Failed to fetch categories")?;

    Ok(rows.into_iter().map(|(sub,)| sub).collect())
}

/// Number of distinct threads archived.
pub async fn count_archived_threads(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT thread_id) FROM threads")
        .fetch_one(pool)
        .await
        .context("Failed to count threads")?;
    Ok(row.0)
}

// ========== Comments ==========

/// Insert a comment, or refresh the row already stored for the same external
/// comment id in the same thread. Returns the surrogate key.
pub async fn upsert_comment(conn: &mut SqliteConnection, comment: &NewComment) -> Result<i64> {
    let row = sqlx::query(
        r"
        INSERT INTO comments (
            comment_id, content, author, thread_key, parent_id,
            timestamp, continues, score
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(thread_key, comment_id) DO UPDATE SET
            content = excluded.content,
            author = excluded.author,
            parent_id = excluded.parent_id,
            timestamp = excluded.timestamp,
            continues = excluded.continues,
            score = excluded.score
        RETURNING id
        ",
    )
    .bind(&comment.comment_id)
    .bind(&comment.content)
    .bind(&comment.author)
    .bind(comment.thread_key)
    .bind(comment.parent_id)
    .bind(comment.timestamp)
    .bind(comment.continues)
    .bind(comment.score)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to upsert comment")?;

    Ok(row.get::<i64, _>("id"))
}

/// Direct replies to `parent_id` (or to the root post when `None`), highest
/// score first. Equal scores keep insertion order.
pub async fn get_child_comments(
    pool: &SqlitePool,
    thread_key: i64,
    parent_id: Option<i64>,
) -> Result<Vec<Comment>> {
    sqlx::query_as(
        r"
        SELECT * FROM comments
        WHERE thread_key = ? AND parent_id IS ?
        ORDER BY score DESC, id ASC
        ",
    )
    .bind(thread_key)
    .bind(parent_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch child comments")
}

/// Number of comments stored for a thread.
pub async fn count_comments(pool: &SqlitePool, thread_key: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE thread_key = ?")
        .bind(thread_key)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
    Ok(row.0)
}

/// Get a stored comment by thread and external comment id.
pub async fn get_comment_by_external_id(
    pool: &SqlitePool,
    thread_key: i64,
    comment_id: &str,
) -> Result<Option<Comment>> {
    sqlx::query_as("SELECT * FROM comments WHERE thread_key = ? AND comment_id = ?")
        .bind(thread_key)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch comment")
}
