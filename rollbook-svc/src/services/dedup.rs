//! Duplicate resolution against the store and within a batch
//!
//! The pre-check here is advisory: the UNIQUE constraint on
//! (voter_id, phone_number) re-verifies at persist time, so a
//! concurrent uploader can still win the race. Commit-time duplicates
//! are handled by the ingestor; this pass exists to report duplicates
//! up front instead of burning chunk inserts on them.

use sqlx::SqlitePool;
use std::collections::HashSet;

use rollbook_common::Result;

use crate::db;
use crate::models::VoterCandidate;

/// Partition candidates into unique rows and duplicate row numbers
///
/// Runs only on rows that already passed validation. Catches both
/// collisions against persisted records and collisions between two
/// rows of the same upload (the first occurrence wins).
pub async fn resolve_duplicates(
    pool: &SqlitePool,
    candidates: Vec<VoterCandidate>,
) -> Result<(Vec<VoterCandidate>, Vec<usize>)> {
    let mut unique = Vec::with_capacity(candidates.len());
    let mut duplicate_rows = Vec::new();
    let mut seen_in_batch: HashSet<(String, String)> = HashSet::new();

    for candidate in candidates {
        let key = candidate.identity_key();

        if seen_in_batch.contains(&key) {
            duplicate_rows.push(candidate.row_number);
            continue;
        }

        let existing =
            db::voters::find_by_identity(pool, &candidate.voter_id, &candidate.phone_number)
                .await?;

        if existing.is_some() {
            duplicate_rows.push(candidate.row_number);
        } else {
            seen_in_batch.insert(key);
            unique.push(candidate);
        }
    }

    Ok((unique, duplicate_rows))
}
