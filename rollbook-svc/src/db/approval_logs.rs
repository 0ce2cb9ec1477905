//! Approval audit trail: append-only

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use rollbook_common::{Error, Result};

use crate::models::{ApprovalAction, ApprovalLogEntry};

/// Append one audit entry
///
/// Entries are never mutated or deleted; there is no update path in
/// this module by design of the table, not just convention.
pub async fn append<'e, E>(
    executor: E,
    submission_id: Uuid,
    action: ApprovalAction,
    performed_by: &str,
    comments: Option<&str>,
) -> Result<Uuid>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO approval_logs (id, submission_id, action, performed_by, comments, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(submission_id.to_string())
    .bind(action.as_str())
    .bind(performed_by)
    .bind(comments)
    .bind(Utc::now().to_rfc3339())
    .execute(executor)
    .await?;

    Ok(id)
}

fn map_row(row: &SqliteRow) -> Result<ApprovalLogEntry> {
    let id: String = row.get("id");
    let submission_id: String = row.get("submission_id");
    let action: String = row.get("action");
    let created_at: String = row.get("created_at");

    Ok(ApprovalLogEntry {
        id: super::parse_uuid(&id, "id")?,
        submission_id: super::parse_uuid(&submission_id, "submission_id")?,
        action: ApprovalAction::parse_str(&action)
            .ok_or_else(|| Error::Internal(format!("Unknown approval action: {}", action)))?,
        performed_by: row.get("performed_by"),
        comments: row.get("comments"),
        created_at: super::parse_timestamp(&created_at, "created_at")?,
    })
}

/// Audit trail for one submission, oldest first
pub async fn list_for_submission(
    pool: &SqlitePool,
    submission_id: Uuid,
) -> Result<Vec<ApprovalLogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, submission_id, action, performed_by, comments, created_at
        FROM approval_logs
        WHERE submission_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_row).collect()
}

/// Number of entries for one submission (test support for idempotency
/// checks: failed transitions must append nothing)
pub async fn count_for_submission(pool: &SqlitePool, submission_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM approval_logs WHERE submission_id = ?")
            .bind(submission_id.to_string())
            .fetch_one(pool)
            .await?;

    Ok(count)
}
