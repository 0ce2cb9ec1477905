//! Approval actions and the append-only audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Action requested against a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionAction {
    /// draft → pending
    Submit,
    /// pending → approved (reviewer capability required)
    Approve,
    /// pending → rejected (reviewer capability required)
    Reject,
}

impl TransitionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionAction::Submit => "submit",
            TransitionAction::Approve => "approve",
            TransitionAction::Reject => "reject",
        }
    }

    /// Audit-log action recorded for a successful transition
    pub fn log_action(self) -> ApprovalAction {
        match self {
            TransitionAction::Submit => ApprovalAction::Submitted,
            TransitionAction::Approve => ApprovalAction::Approved,
            TransitionAction::Reject => ApprovalAction::Rejected,
        }
    }
}

/// Action as recorded on the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Submitted,
    Approved,
    Rejected,
    Cancelled,
}

impl ApprovalAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalAction::Submitted => "submitted",
            ApprovalAction::Approved => "approved",
            ApprovalAction::Rejected => "rejected",
            ApprovalAction::Cancelled => "cancelled",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ApprovalAction::Submitted),
            "approved" => Some(ApprovalAction::Approved),
            "rejected" => Some(ApprovalAction::Rejected),
            "cancelled" => Some(ApprovalAction::Cancelled),
            _ => None,
        }
    }
}

/// Immutable audit record; appended on every successful transition,
/// never mutated or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalLogEntry {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub action: ApprovalAction,
    pub performed_by: Option<String>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}
