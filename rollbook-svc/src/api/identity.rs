//! Request identity resolution
//!
//! Identity arrives pre-authenticated from the fronting identity
//! provider as `X-User-Id` / `X-User-Role` headers. This module only
//! resolves and mirrors it; it never authenticates.

use axum::http::HeaderMap;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{RequestContext, Role};
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Resolve the acting identity from request headers
pub fn resolve_identity(headers: &HeaderMap) -> ApiResult<RequestContext> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing X-User-Id header".to_string()))?;

    let role_str = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing X-User-Role header".to_string()))?;

    let role = Role::parse_str(role_str)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role: {}", role_str)))?;

    Ok(RequestContext {
        user_id: user_id.to_string(),
        role,
    })
}

/// Resolve identity and mirror the acting user into the users table
pub async fn resolve_and_record(state: &AppState, headers: &HeaderMap) -> ApiResult<RequestContext> {
    let ctx = resolve_identity(headers)?;
    db::users::ensure_user(&state.db, &ctx.user_id, ctx.role).await?;
    Ok(ctx)
}
