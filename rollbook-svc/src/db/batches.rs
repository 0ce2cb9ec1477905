//! Submission batch database operations

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use rollbook_common::{Error, Result};

use crate::models::{BatchStatus, RecordStatus, SubmissionBatch};

fn map_row(row: &SqliteRow) -> Result<SubmissionBatch> {
    let id: String = row.get("id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(SubmissionBatch {
        id: super::parse_uuid(&id, "id")?,
        batch_name: row.get("batch_name"),
        file_name: row.get("file_name"),
        total_records: row.get("total_records"),
        approved_records: row.get("approved_records"),
        rejected_records: row.get("rejected_records"),
        pending_records: row.get("pending_records"),
        status: BatchStatus::parse_str(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown batch status: {}", status)))?,
        submitted_by: row.get("submitted_by"),
        created_at: super::parse_timestamp(&created_at, "created_at")?,
        updated_at: super::parse_timestamp(&updated_at, "updated_at")?,
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, batch_name, file_name, total_records, approved_records,
           rejected_records, pending_records, status, submitted_by,
           created_at, updated_at
    FROM submission_batches
"#;

/// Create the batch row for an ingestion run
pub async fn create(
    pool: &SqlitePool,
    batch_name: &str,
    file_name: Option<&str>,
    total_records: usize,
    status: BatchStatus,
    submitted_by: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO submission_batches (
            id, batch_name, file_name, total_records, status,
            submitted_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(batch_name)
    .bind(file_name)
    .bind(total_records as i64)
    .bind(status.as_str())
    .bind(submitted_by)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Load one batch
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<SubmissionBatch>> {
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_row).transpose()
}

/// List batches, newest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<SubmissionBatch>> {
    let query = format!("{} ORDER BY created_at DESC", SELECT_COLUMNS);
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    rows.iter().map(map_row).collect()
}

/// Record how many rows actually landed once the chunk sequence ends
///
/// An aborted run leaves total_records at the committed count, not the
/// attempted one. Pending count mirrors the inserted rows that are
/// awaiting review (zero for draft-mode batches).
pub async fn finalize_counts(
    pool: &SqlitePool,
    id: Uuid,
    inserted: usize,
    pending: usize,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE submission_batches
        SET total_records = ?, pending_records = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(inserted as i64)
    .bind(pending as i64)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    tracing::debug!(batch_id = %id, inserted, pending, "Batch counters finalized");
    Ok(())
}

/// Fold one reviewer decision into the batch counters
///
/// The first decision moves a submitted batch to under_review; the last
/// pending record moving out completes it.
pub async fn apply_decision<'e, E>(executor: E, id: Uuid, decision: RecordStatus) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let (approved_delta, rejected_delta) = match decision {
        RecordStatus::Approved => (1i64, 0i64),
        RecordStatus::Rejected => (0, 1),
        // Only terminal decisions touch the counters
        _ => return Ok(()),
    };

    sqlx::query(
        r#"
        UPDATE submission_batches
        SET approved_records = approved_records + ?,
            rejected_records = rejected_records + ?,
            pending_records = MAX(pending_records - 1, 0),
            status = CASE
                WHEN pending_records - 1 <= 0 THEN 'completed'
                ELSE 'under_review'
            END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(approved_delta)
    .bind(rejected_delta)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(())
}

/// A record in this batch went back to pending (resubmission)
pub async fn increment_pending<'e, E>(executor: E, id: Uuid) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE submission_batches
        SET pending_records = pending_records + 1,
            status = CASE WHEN status = 'completed' THEN 'under_review' ELSE status END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(())
}

/// A pending record in this batch was pulled back to draft
pub async fn decrement_pending<'e, E>(executor: E, id: Uuid) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE submission_batches
        SET pending_records = MAX(pending_records - 1, 0), updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(())
}
