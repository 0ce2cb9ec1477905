//! Domain models for the Rollbook service

pub mod approval;
pub mod batch;
pub mod identity;
pub mod ingest;
pub mod voter;

pub use approval::{ApprovalAction, ApprovalLogEntry, TransitionAction};
pub use batch::{BatchStatus, SubmissionBatch};
pub use identity::{allowed_actions, ActionKind, RequestContext, Role};
pub use ingest::{IngestFailure, IngestMode, IngestResult, RowDisposition, RowOutcome, ValidationError};
pub use voter::{Gender, RawRecord, RecordStatus, VoterCandidate, VoterRecord};
