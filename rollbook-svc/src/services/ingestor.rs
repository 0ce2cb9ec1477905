//! Batch ingestion orchestration
//!
//! parse → validate → dedupe → chunked persist. Chunks are inserted
//! strictly in sequence; each chunk is atomic but independent of the
//! others, so a late failure leaves earlier chunks committed and the
//! result reports exactly how far the run got.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use thiserror::Error;

use rollbook_common::events::{EventBus, RollbookEvent};

use crate::db;
use crate::db::voters::ChunkInsertError;
use crate::models::{
    BatchStatus, IngestFailure, IngestMode, IngestResult, RecordStatus, RequestContext,
    RowDisposition, RowOutcome, ValidationError, VoterCandidate,
};
use crate::services::{dedup, spreadsheet, validator};
use crate::services::spreadsheet::FormatError;

/// Rows persisted per store operation
pub const CHUNK_SIZE: usize = 100;

/// One bulk-upload request
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub file_bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub batch_name: String,
    pub mode: IngestMode,
}

/// Terminal ingestion failure (before any persistence)
///
/// Per-row problems never surface here; they are data in the result.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] rollbook_common::Error),
}

/// Run one ingestion
///
/// Returns `Err` only for structural failures (bad workbook) or a
/// storage fault before the batch exists. Once chunk insertion starts,
/// failures are folded into the partial result instead.
pub async fn ingest(
    pool: &SqlitePool,
    event_bus: &EventBus,
    request: IngestRequest,
    ctx: &RequestContext,
) -> Result<IngestResult, IngestError> {
    // 1. Parse; only header/structure problems abort
    let raw_records = spreadsheet::parse_workbook(&request.file_bytes)?;
    let total_parsed = raw_records.len();

    // 2. Validate every row, accumulating all findings
    let mut validation_errors: Vec<ValidationError> = Vec::new();
    let mut valid: Vec<VoterCandidate> = Vec::new();
    let mut invalid: Vec<VoterCandidate> = Vec::new();

    for raw in &raw_records {
        let (candidate, errors) = validator::validate(raw);
        if errors.is_empty() {
            valid.push(candidate);
        } else {
            invalid.push(candidate);
            validation_errors.extend(errors);
        }
    }

    let mut dispositions: BTreeMap<usize, RowDisposition> = BTreeMap::new();

    // 3. Mode gating: submit persists only clean rows; drafts may be
    // incomplete
    let gated_invalid: Vec<VoterCandidate> = match request.mode {
        IngestMode::Submit => {
            for candidate in &invalid {
                dispositions.insert(candidate.row_number, RowDisposition::ValidationFailed);
            }
            Vec::new()
        }
        IngestMode::Draft => invalid,
    };

    // 4. Dedupe the zero-error rows against store + within this upload
    let (unique, duplicate_rows) = dedup::resolve_duplicates(pool, valid).await?;
    for row in &duplicate_rows {
        dispositions.insert(*row, RowDisposition::Duplicate { at_commit: false });
    }

    let mut to_insert = unique;
    to_insert.extend(gated_invalid);
    to_insert.sort_by_key(|c| c.row_number);

    // 5. One batch row for the run
    let (batch_status, record_status, submitted_at) = match request.mode {
        IngestMode::Draft => (BatchStatus::Draft, RecordStatus::Draft, None),
        IngestMode::Submit => (BatchStatus::Submitted, RecordStatus::Pending, Some(Utc::now())),
    };

    let batch_id = db::batches::create(
        pool,
        &request.batch_name,
        request.file_name.as_deref(),
        to_insert.len(),
        batch_status,
        &ctx.user_id,
    )
    .await?;

    tracing::info!(
        batch_id = %batch_id,
        batch_name = %request.batch_name,
        total_parsed,
        to_insert = to_insert.len(),
        mode = ?request.mode,
        "Ingestion run started"
    );

    event_bus
        .emit(RollbookEvent::IngestStarted {
            batch_id,
            batch_name: request.batch_name.clone(),
            total_to_insert: to_insert.len(),
            timestamp: Utc::now(),
        })
        .ok();

    // 6./7. Sequential chunk inserts; abort the rest on first failure
    let total_to_insert = to_insert.len();
    let mut inserted = 0usize;
    let mut failure: Option<IngestFailure> = None;

    for (chunk_index, chunk) in to_insert.chunks(CHUNK_SIZE).enumerate() {
        if failure.is_some() {
            for candidate in chunk {
                dispositions.insert(candidate.row_number, RowDisposition::SkippedAborted);
            }
            continue;
        }

        let result = db::voters::insert_chunk(
            pool,
            chunk,
            batch_id,
            record_status,
            &ctx.user_id,
            submitted_at,
        )
        .await;

        match result {
            Ok(()) => {
                inserted += chunk.len();
                for candidate in chunk {
                    dispositions.insert(candidate.row_number, RowDisposition::Inserted);
                }
                event_bus
                    .emit(RollbookEvent::IngestProgress {
                        batch_id,
                        inserted_so_far: inserted,
                        total_to_insert,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
            Err(ChunkInsertError::UniqueViolation { row }) => {
                // A row that passed the advisory pre-check lost the
                // race. Whole chunk rolled back; nothing is retried.
                tracing::warn!(
                    batch_id = %batch_id,
                    chunk_index,
                    row,
                    "Uniqueness constraint hit at commit time, aborting remaining chunks"
                );
                for candidate in chunk {
                    let disposition = if candidate.row_number == row {
                        RowDisposition::Duplicate { at_commit: true }
                    } else {
                        RowDisposition::SkippedAborted
                    };
                    dispositions.insert(candidate.row_number, disposition);
                }
                failure = Some(IngestFailure::DuplicateAtCommit { chunk_index, row });
            }
            Err(ChunkInsertError::Database(e)) => {
                tracing::error!(
                    batch_id = %batch_id,
                    chunk_index,
                    error = %e,
                    "Chunk insert failed, aborting remaining chunks"
                );
                for candidate in chunk {
                    dispositions.insert(candidate.row_number, RowDisposition::SkippedAborted);
                }
                failure = Some(IngestFailure::ChunkPersist {
                    chunk_index,
                    message: e.to_string(),
                });
            }
        }
    }

    // 8. Counters reflect what actually landed
    let pending = match request.mode {
        IngestMode::Submit => inserted,
        IngestMode::Draft => 0,
    };
    db::batches::finalize_counts(pool, batch_id, inserted, pending).await?;

    let total_errors = {
        let mut rows: Vec<usize> = validation_errors.iter().map(|e| e.row).collect();
        rows.dedup();
        rows.len()
    };
    let total_duplicates = dispositions
        .values()
        .filter(|d| matches!(d, RowDisposition::Duplicate { .. }))
        .count();

    event_bus
        .emit(RollbookEvent::IngestCompleted {
            batch_id,
            total_inserted: inserted,
            total_errors,
            total_duplicates,
            aborted: failure.is_some(),
            timestamp: Utc::now(),
        })
        .ok();

    tracing::info!(
        batch_id = %batch_id,
        inserted,
        total_duplicates,
        total_errors,
        aborted = failure.is_some(),
        "Ingestion run finished"
    );

    let per_row_outcome: Vec<RowOutcome> = dispositions
        .into_iter()
        .map(|(row, disposition)| RowOutcome { row, disposition })
        .collect();

    let result = IngestResult {
        batch_id,
        batch_status,
        total_parsed,
        total_errors,
        total_duplicates,
        total_inserted: inserted,
        per_row_outcome,
        validation_errors,
        failure,
    };

    debug_assert!(result.accounts_for_all_rows());
    Ok(result)
}
