//! Voter record types: raw parsed rows, validated candidates, and
//! persisted submissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gender as it appears in the spreadsheet and the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    /// Exact-match parse; anything else is a validation error upstream
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            "Other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Lifecycle status of a voter submission
///
/// draft → pending → {approved | rejected}; approved and rejected are
/// terminal. pending → draft happens only through explicit resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Pending => "pending",
            RecordStatus::Approved => "approved",
            RecordStatus::Rejected => "rejected",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(RecordStatus::Draft),
            "pending" => Some(RecordStatus::Pending),
            "approved" => Some(RecordStatus::Approved),
            "rejected" => Some(RecordStatus::Rejected),
            _ => None,
        }
    }

    /// Terminal states permit no further status mutation
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordStatus::Approved | RecordStatus::Rejected)
    }
}

/// One spreadsheet row as parsed, before validation
///
/// Cells are trimmed strings with empty normalized to None; the phone
/// cell is already stripped to digits. Malformed values (for example a
/// non-numeric Age) are retained as-is so the validator can attach
/// field-level errors with the right row number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Spreadsheet row for error correlation (header is row 1, first
    /// data row is row 2)
    pub row_number: usize,
    pub voter_id: Option<String>,
    pub phone_number: Option<String>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub father_husband_name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub qualification: Option<String>,
    pub caste: Option<String>,
    pub sub_caste: Option<String>,
    pub pc: Option<String>,
    pub ac: Option<String>,
    pub mandal_ward_division: Option<String>,
    pub panchayat_name: Option<String>,
    pub village_name: Option<String>,
    pub booth: Option<String>,
}

/// A normalized record ready for insertion
///
/// Built for every parsed row, even invalid ones, because draft-mode
/// ingestion persists incomplete rows. Whether the row is actually
/// valid is carried separately as the validator's error list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterCandidate {
    pub row_number: usize,
    pub voter_id: String,
    pub phone_number: String,
    pub surname: Option<String>,
    pub name: String,
    pub father_husband_name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub qualification: Option<String>,
    pub caste: Option<String>,
    pub sub_caste: Option<String>,
    pub pc: Option<String>,
    pub ac: Option<String>,
    pub mandal_ward_division: Option<String>,
    pub panchayat_name: Option<String>,
    pub village_name: Option<String>,
    pub booth: Option<String>,
}

impl VoterCandidate {
    /// The system-wide identity key (voter_id, phone_number)
    pub fn identity_key(&self) -> (String, String) {
        (self.voter_id.clone(), self.phone_number.clone())
    }
}

/// A persisted voter submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: Uuid,
    pub voter_id: String,
    pub phone_number: String,
    pub surname: Option<String>,
    pub name: String,
    pub father_husband_name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub qualification: Option<String>,
    pub caste: Option<String>,
    pub sub_caste: Option<String>,
    pub pc: Option<String>,
    pub ac: Option<String>,
    pub mandal_ward_division: Option<String>,
    pub panchayat_name: Option<String>,
    pub village_name: Option<String>,
    pub booth: Option<String>,
    /// Weak back-reference to the originating batch; deleting the batch
    /// does not delete the record
    pub batch_id: Option<Uuid>,
    pub status: RecordStatus,
    pub submitted_by: Option<String>,
    pub approved_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}
