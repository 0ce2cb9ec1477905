//! Database access for rollbook-svc
//!
//! SQLite through sqlx. Uuids and timestamps are stored as TEXT
//! (RFC3339); statuses as their lowercase names. The uniqueness
//! constraint on (voter_id, phone_number) lives here and is the
//! authoritative duplicate guard at persist time.

pub mod approval_logs;
pub mod batches;
pub mod users;
pub mod voters;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use uuid::Uuid;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create an in-memory pool with the full schema (test support)
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:").await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create the rollbook tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT,
            full_name TEXT,
            role TEXT NOT NULL DEFAULT 'submitter',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submission_batches (
            id TEXT PRIMARY KEY,
            batch_name TEXT NOT NULL,
            file_name TEXT,
            total_records INTEGER NOT NULL DEFAULT 0,
            approved_records INTEGER NOT NULL DEFAULT 0,
            rejected_records INTEGER NOT NULL DEFAULT 0,
            pending_records INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft',
            submitted_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS voter_submissions (
            id TEXT PRIMARY KEY,
            voter_id TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            surname TEXT,
            name TEXT NOT NULL,
            father_husband_name TEXT,
            gender TEXT,
            age INTEGER,
            qualification TEXT,
            caste TEXT,
            sub_caste TEXT,
            pc TEXT,
            ac TEXT,
            mandal_ward_division TEXT,
            panchayat_name TEXT,
            village_name TEXT,
            booth TEXT,
            batch_id TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            submitted_by TEXT,
            approved_by TEXT,
            rejection_reason TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            submitted_at TEXT,
            approved_at TEXT,
            UNIQUE (voter_id, phone_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_voter_submissions_status ON voter_submissions (status)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS approval_logs (
            id TEXT PRIMARY KEY,
            submission_id TEXT,
            action TEXT NOT NULL,
            performed_by TEXT,
            comments TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (users, submission_batches, voter_submissions, approval_logs)"
    );

    Ok(())
}

/// Parse a TEXT uuid column
pub(crate) fn parse_uuid(value: &str, column: &str) -> rollbook_common::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| {
        rollbook_common::Error::Internal(format!("Failed to parse {}: {}", column, e))
    })
}

/// Parse a TEXT RFC3339 timestamp column
pub(crate) fn parse_timestamp(value: &str, column: &str) -> rollbook_common::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rollbook_common::Error::Internal(format!("Failed to parse {}: {}", column, e))
        })
}

/// Parse an optional TEXT RFC3339 timestamp column
pub(crate) fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> rollbook_common::Result<Option<DateTime<Utc>>> {
    value.map(|s| parse_timestamp(&s, column)).transpose()
}
