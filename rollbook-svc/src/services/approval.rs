//! Approval workflow: guarded single-record transitions
//!
//! Every successful transition updates the record, appends one audit
//! entry, and maintains the owning batch's counters inside a single
//! transaction. The status predicate in the UPDATE is the concurrency
//! guard: two reviewers racing on one record produce exactly one
//! transition and one clean failure, never two log entries.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use rollbook_common::events::{EventBus, RollbookEvent};

use crate::db;
use crate::models::{
    ActionKind, ApprovalAction, RecordStatus, RequestContext, TransitionAction, VoterRecord,
};

/// Why a transition was refused
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Submission not found")]
    NotFound,

    #[error("{0}")]
    Unauthorized(&'static str),

    /// The record was not in the status the action requires. Also the
    /// outcome of losing a race: the guarded UPDATE touched zero rows.
    #[error("{0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Storage(#[from] rollbook_common::Error),
}

impl From<sqlx::Error> for TransitionError {
    fn from(e: sqlx::Error) -> Self {
        TransitionError::Storage(rollbook_common::Error::Database(e))
    }
}

fn authorize(
    action: TransitionAction,
    record: &VoterRecord,
    ctx: &RequestContext,
) -> Result<(), TransitionError> {
    match action {
        TransitionAction::Submit => {
            if !ctx.can(ActionKind::SubmitRecords) {
                return Err(TransitionError::Unauthorized(
                    "Role does not permit submitting records",
                ));
            }
            // Submitters may only move their own drafts forward
            let owns = record.submitted_by.as_deref() == Some(ctx.user_id.as_str());
            if !owns && !ctx.can(ActionKind::ReviewRecords) {
                return Err(TransitionError::Unauthorized(
                    "Only the submitter may submit this record",
                ));
            }
            Ok(())
        }
        TransitionAction::Approve | TransitionAction::Reject => {
            if !ctx.can(ActionKind::ReviewRecords) {
                return Err(TransitionError::Unauthorized(
                    "Role does not permit reviewing records",
                ));
            }
            Ok(())
        }
    }
}

/// Apply one approval-workflow action to a record
///
/// Accepted transitions: draft → pending (submit), pending → approved,
/// pending → rejected. Anything else fails cleanly with the record
/// untouched and nothing appended to the audit trail. `comments` is
/// stored on the log entry and, for reject, as the rejection reason.
pub async fn transition(
    pool: &SqlitePool,
    event_bus: &EventBus,
    record_id: Uuid,
    action: TransitionAction,
    ctx: &RequestContext,
    comments: Option<&str>,
) -> Result<VoterRecord, TransitionError> {
    let record = db::voters::get(pool, record_id)
        .await?
        .ok_or(TransitionError::NotFound)?;

    authorize(action, &record, ctx)?;

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let affected = match action {
        TransitionAction::Submit => {
            db::voters::submit_guarded(&mut *tx, record_id, now).await?
        }
        TransitionAction::Approve => {
            db::voters::decide_guarded(
                &mut *tx,
                record_id,
                RecordStatus::Approved,
                &ctx.user_id,
                None,
                now,
            )
            .await?
        }
        TransitionAction::Reject => {
            db::voters::decide_guarded(
                &mut *tx,
                record_id,
                RecordStatus::Rejected,
                &ctx.user_id,
                comments,
                now,
            )
            .await?
        }
    };

    if affected == 0 {
        // Dropping the transaction discards nothing but the savepoint;
        // no record change happened and no log entry is written.
        let message = match action {
            TransitionAction::Submit => "Record is not in draft status",
            TransitionAction::Approve | TransitionAction::Reject => {
                "Record is not pending review"
            }
        };
        return Err(TransitionError::InvalidState(message));
    }

    if let Some(batch_id) = record.batch_id {
        match action {
            TransitionAction::Submit => {
                db::batches::increment_pending(&mut *tx, batch_id).await?;
            }
            TransitionAction::Approve => {
                db::batches::apply_decision(&mut *tx, batch_id, RecordStatus::Approved).await?;
            }
            TransitionAction::Reject => {
                db::batches::apply_decision(&mut *tx, batch_id, RecordStatus::Rejected).await?;
            }
        }
    }

    db::approval_logs::append(
        &mut *tx,
        record_id,
        action.log_action(),
        &ctx.user_id,
        comments,
    )
    .await?;

    tx.commit().await?;

    let updated = db::voters::get(pool, record_id)
        .await?
        .ok_or(TransitionError::NotFound)?;

    tracing::info!(
        submission_id = %record_id,
        action = action.as_str(),
        new_status = updated.status.as_str(),
        performed_by = %ctx.user_id,
        "Record transitioned"
    );

    event_bus
        .emit(RollbookEvent::RecordTransitioned {
            submission_id: record_id,
            action: action.as_str().to_string(),
            new_status: updated.status.as_str().to_string(),
            performed_by: ctx.user_id.clone(),
            timestamp: now,
        })
        .ok();

    Ok(updated)
}

/// Pull a pending record back to draft for correction
///
/// Owner-only (admins may also withdraw). Logged as a cancellation so
/// the audit trail shows the full submit/withdraw history.
pub async fn withdraw(
    pool: &SqlitePool,
    event_bus: &EventBus,
    record_id: Uuid,
    ctx: &RequestContext,
) -> Result<VoterRecord, TransitionError> {
    let record = db::voters::get(pool, record_id)
        .await?
        .ok_or(TransitionError::NotFound)?;

    let owns = record.submitted_by.as_deref() == Some(ctx.user_id.as_str());
    if !owns && !ctx.can(ActionKind::ReviewRecords) {
        return Err(TransitionError::Unauthorized(
            "Only the submitter may withdraw this record",
        ));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let affected = db::voters::withdraw_guarded(&mut *tx, record_id, now).await?;
    if affected == 0 {
        return Err(TransitionError::InvalidState(
            "Record is not pending review",
        ));
    }

    if let Some(batch_id) = record.batch_id {
        db::batches::decrement_pending(&mut *tx, batch_id).await?;
    }

    db::approval_logs::append(
        &mut *tx,
        record_id,
        ApprovalAction::Cancelled,
        &ctx.user_id,
        None,
    )
    .await?;

    tx.commit().await?;

    let updated = db::voters::get(pool, record_id)
        .await?
        .ok_or(TransitionError::NotFound)?;

    event_bus
        .emit(RollbookEvent::RecordTransitioned {
            submission_id: record_id,
            action: "withdraw".to_string(),
            new_status: updated.status.as_str().to_string(),
            performed_by: ctx.user_id.clone(),
            timestamp: now,
        })
        .ok();

    Ok(updated)
}
