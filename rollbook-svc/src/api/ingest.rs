//! Bulk upload and batch API handlers
//!
//! POST /batches/upload, GET /batches, GET /batches/:id

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::identity::resolve_and_record;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ActionKind, IngestMode, IngestResult, SubmissionBatch};
use crate::services::ingestor::{self, IngestRequest};
use crate::AppState;

/// POST /batches/upload request
///
/// The workbook travels base64-encoded in the JSON body.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub batch_name: String,
    pub file_name: Option<String>,
    /// Base64-encoded .xlsx bytes
    pub file: String,
    #[serde(default = "default_mode")]
    pub mode: IngestMode,
}

fn default_mode() -> IngestMode {
    IngestMode::Submit
}

/// POST /batches/upload
///
/// Runs one full ingestion: parse, validate, dedupe, chunked insert.
/// Per-row problems are reported in the result body, not as an HTTP
/// error; only a structurally unusable workbook fails the request.
pub async fn upload_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UploadRequest>,
) -> ApiResult<Json<IngestResult>> {
    let ctx = resolve_and_record(&state, &headers).await?;
    if !ctx.can(ActionKind::SubmitRecords) {
        return Err(ApiError::Forbidden(
            "Role does not permit submitting records".to_string(),
        ));
    }

    if request.batch_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Batch name is required".to_string()));
    }

    let file_bytes = BASE64
        .decode(request.file.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 file payload: {}", e)))?;

    let result = ingestor::ingest(
        &state.db,
        &state.event_bus,
        IngestRequest {
            file_bytes,
            file_name: request.file_name,
            batch_name: request.batch_name,
            mode: request.mode,
        },
        &ctx,
    )
    .await?;

    Ok(Json(result))
}

/// GET /batches
pub async fn list_batches(State(state): State<AppState>) -> ApiResult<Json<Vec<SubmissionBatch>>> {
    let batches = db::batches::list(&state.db).await?;
    Ok(Json(batches))
}

/// GET /batches/:id
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubmissionBatch>> {
    let batch = db::batches::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found: {}", id)))?;
    Ok(Json(batch))
}

/// Build batch routes
pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/batches/upload", post(upload_batch))
        .route("/batches", get(list_batches))
        .route("/batches/:id", get(get_batch))
}
