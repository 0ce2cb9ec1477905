//! Ingestion request/result types
//!
//! The ingest result accounts for every parsed row in exactly one of:
//! validation error, duplicate, inserted, or skipped due to an aborted
//! chunk sequence.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::batch::BatchStatus;

/// Upload mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// All rows proceed, even ones with field errors; records land in
    /// draft status
    Draft,
    /// Only rows with zero validation errors proceed; records land in
    /// pending status
    Submit,
}

/// A per-field, per-row validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Spreadsheet row (header is row 1)
    pub row: usize,
    pub field: String,
    pub message: String,
}

/// Where a row ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum RowDisposition {
    /// Persisted in a committed chunk
    Inserted,
    /// Had validation errors and was gated out (submit mode only)
    ValidationFailed,
    /// Collided on (voter_id, phone_number), either against the store
    /// pre-check, within the same upload, or at commit time
    Duplicate { at_commit: bool },
    /// Never attempted because an earlier chunk failure aborted the run
    SkippedAborted,
}

/// Outcome for one parsed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row: usize,
    #[serde(flatten)]
    pub disposition: RowDisposition,
}

/// Why an ingestion run stopped early
///
/// Either way, chunks already committed stay committed and their row
/// count is preserved in the result. Neither case is retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestFailure {
    /// The store's uniqueness constraint rejected a row that passed the
    /// advisory pre-check (race with a concurrent uploader)
    DuplicateAtCommit { chunk_index: usize, row: usize },
    /// A chunk insert failed for any other reason (timeout counts too)
    ChunkPersist { chunk_index: usize, message: String },
}

/// Aggregated outcome of one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub batch_id: Uuid,
    pub batch_status: BatchStatus,
    pub total_parsed: usize,
    /// Rows with at least one validation error
    pub total_errors: usize,
    /// Pre-check, in-batch, and commit-time duplicates combined
    pub total_duplicates: usize,
    pub total_inserted: usize,
    /// One entry per parsed row
    pub per_row_outcome: Vec<RowOutcome>,
    /// All field-level findings, for rendering a full report
    pub validation_errors: Vec<ValidationError>,
    /// Present when the chunk sequence stopped early
    pub failure: Option<IngestFailure>,
}

impl IngestResult {
    /// Every parsed row must appear in the outcome list exactly once
    pub fn accounts_for_all_rows(&self) -> bool {
        self.per_row_outcome.len() == self.total_parsed
    }
}
