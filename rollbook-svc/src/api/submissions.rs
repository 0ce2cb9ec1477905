//! Single-record submission and approval API handlers
//!
//! POST /submissions, GET /submissions, GET /submissions/:id,
//! POST /submissions/:id/transition, POST /submissions/:id/withdraw,
//! GET /submissions/:id/logs

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::identity::resolve_and_record;
use crate::db;
use crate::db::voters::ChunkInsertError;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ActionKind, ApprovalLogEntry, IngestMode, RawRecord, RecordStatus, TransitionAction,
    VoterRecord,
};
use crate::services::{approval, validator};
use crate::AppState;

/// POST /submissions request: one voter entered by hand
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AddVoterRequest {
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
    pub mode: Option<IngestMode>,
}

impl AddVoterRequest {
    fn into_raw(self) -> (RawRecord, IngestMode) {
        let mode = self.mode.unwrap_or(IngestMode::Submit);
        let trim = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let raw = RawRecord {
            // Hand-entered records have no spreadsheet row
            row_number: 0,
            voter_id: trim(self.voter_id),
            phone_number: trim(self.phone_number),
            surname: trim(self.surname),
            name: trim(self.name),
            father_husband_name: trim(self.father_husband_name),
            gender: trim(self.gender),
            age: trim(self.age),
            qualification: trim(self.qualification),
            caste: trim(self.caste),
            sub_caste: trim(self.sub_caste),
            pc: trim(self.pc),
            ac: trim(self.ac),
            mandal_ward_division: trim(self.mandal_ward_division),
            panchayat_name: trim(self.panchayat_name),
            village_name: trim(self.village_name),
            booth: trim(self.booth),
        };
        (raw, mode)
    }
}

/// POST /submissions
///
/// Hand entry follows the same rules as bulk upload: full validation,
/// then the advisory duplicate pre-check, with the uniqueness
/// constraint backstopping races at insert time.
pub async fn add_voter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddVoterRequest>,
) -> ApiResult<Json<VoterRecord>> {
    let ctx = resolve_and_record(&state, &headers).await?;
    if !ctx.can(ActionKind::SubmitRecords) {
        return Err(ApiError::Forbidden(
            "Role does not permit submitting records".to_string(),
        ));
    }

    let (raw, mode) = request.into_raw();
    let (candidate, errors) = validator::validate(&raw);
    if !errors.is_empty() {
        let summary = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::BadRequest(summary));
    }

    let existing =
        db::voters::find_by_identity(&state.db, &candidate.voter_id, &candidate.phone_number)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "A record with this voter ID and phone number already exists".to_string(),
        ));
    }

    let (status, submitted_at) = match mode {
        IngestMode::Draft => (RecordStatus::Draft, None),
        IngestMode::Submit => (RecordStatus::Pending, Some(Utc::now())),
    };

    let id = db::voters::insert_one(&state.db, &candidate, status, &ctx.user_id, submitted_at)
        .await
        .map_err(|e| match e {
            ChunkInsertError::UniqueViolation { .. } => ApiError::Conflict(
                "A record with this voter ID and phone number already exists".to_string(),
            ),
            ChunkInsertError::Database(db_err) => {
                ApiError::Common(rollbook_common::Error::Database(db_err))
            }
        })?;

    let record = db::voters::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal("Inserted record not readable".to_string()))?;

    tracing::info!(
        submission_id = %id,
        status = record.status.as_str(),
        submitted_by = %ctx.user_id,
        "Voter record added"
    );

    Ok(Json(record))
}

/// GET /submissions query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub status: Option<RecordStatus>,
    pub submitted_by: Option<String>,
}

/// GET /submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<VoterRecord>>> {
    let records =
        db::voters::list(&state.db, query.status, query.submitted_by.as_deref()).await?;
    Ok(Json(records))
}

/// GET /submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VoterRecord>> {
    let record = db::voters::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission not found: {}", id)))?;
    Ok(Json(record))
}

/// POST /submissions/:id/transition request
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub action: TransitionAction,
    pub comments: Option<String>,
}

/// POST /submissions/:id/transition
pub async fn transition_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Json<VoterRecord>> {
    let ctx = resolve_and_record(&state, &headers).await?;
    let record = approval::transition(
        &state.db,
        &state.event_bus,
        id,
        request.action,
        &ctx,
        request.comments.as_deref(),
    )
    .await?;
    Ok(Json(record))
}

/// POST /submissions/:id/withdraw
pub async fn withdraw_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<VoterRecord>> {
    let ctx = resolve_and_record(&state, &headers).await?;
    let record = approval::withdraw(&state.db, &state.event_bus, id, &ctx).await?;
    Ok(Json(record))
}

/// GET /submissions/:id/logs
pub async fn submission_logs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ApprovalLogEntry>>> {
    let entries = db::approval_logs::list_for_submission(&state.db, id).await?;
    Ok(Json(entries))
}

/// Build submission routes
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(add_voter).get(list_submissions))
        .route("/submissions/:id", get(get_submission))
        .route("/submissions/:id/transition", post(transition_submission))
        .route("/submissions/:id/withdraw", post(withdraw_submission))
        .route("/submissions/:id/logs", get(submission_logs))
}
