use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        debug!("Running migration v2");
        run_migration_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating threads and comments");

    // Threads table. continuing_reply is '' for a root thread and the id of
    // the comment it continues otherwise.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS threads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id TEXT NOT NULL,
            continuing_reply TEXT NOT NULL DEFAULT '',
            replies_num INTEGER NOT NULL DEFAULT 0,
            sub TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            content_link TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL DEFAULT 0,
            archive_timestamp INTEGER NOT NULL,
            CONSTRAINT unq UNIQUE(thread_id, continuing_reply),
            CONSTRAINT chk_id CHECK(LENGTH(thread_id) >= 6),
            CONSTRAINT chk_title CHECK(LENGTH(title) > 1),
            CONSTRAINT chk_sub CHECK(LENGTH(sub) > 1)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create threads table")?;

    // Comments table
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            comment_id TEXT,
            content TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '',
            thread_key INTEGER NOT NULL REFERENCES threads(id),
            parent_id INTEGER REFERENCES comments(id),
            timestamp INTEGER NOT NULL DEFAULT 0,
            continues INTEGER NOT NULL DEFAULT 0,
            score INTEGER NOT NULL DEFAULT 0,
            CONSTRAINT unq_comment UNIQUE(thread_key, comment_id)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create comments table")?;

    Ok(())
}

async fn run_migration_v2(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v2: adding lookup indexes");

    sqlx::query("CREATE INDEX IF NOT EXISTS threads_id_index ON threads(thread_id)")
        .execute(pool)
        .await
        .context("Failed to create thread id index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS threads_archive_timestamp_index ON threads(archive_timestamp)",
    )
    .execute(pool)
    .await
    .context("Failed to create archive timestamp index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS threads_sub_index ON threads(sub)")
        .execute(pool)
        .await
        .context("Failed to create sub index")?;

    // Every reconstruction step filters on both columns.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS comments_parent_index ON comments(thread_key, parent_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create comment parent index")?;

    Ok(())
}
