//! Submission batch: groups records uploaded together

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    Submitted,
    UnderReview,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Draft => "draft",
            BatchStatus::Submitted => "submitted",
            BatchStatus::UnderReview => "under_review",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BatchStatus::Draft),
            "submitted" => Some(BatchStatus::Submitted),
            "under_review" => Some(BatchStatus::UnderReview),
            "completed" => Some(BatchStatus::Completed),
            "cancelled" => Some(BatchStatus::Cancelled),
            _ => None,
        }
    }
}

/// A batch of voter submissions originating from one upload
///
/// The counter columns are derived from reviewer decisions and
/// maintained inside the same transaction as each decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionBatch {
    pub id: Uuid,
    pub batch_name: String,
    pub file_name: Option<String>,
    pub total_records: i64,
    pub approved_records: i64,
    pub rejected_records: i64,
    pub pending_records: i64,
    pub status: BatchStatus,
    pub submitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            BatchStatus::Draft,
            BatchStatus::Submitted,
            BatchStatus::UnderReview,
            BatchStatus::Completed,
            BatchStatus::Cancelled,
        ] {
            assert_eq!(BatchStatus::parse_str(status.as_str()), Some(status));
        }
    }
}
