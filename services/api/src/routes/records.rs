//! Domain record routes
//!
//! One uniform surface over the eight owned-record tables. Reads follow the
//! acting role (a nominee sees the related owner's rows in its granted
//! categories); writes always require a writable role and target the
//! caller's own rows.

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
    models::{NewRecord, OwnedRecord, RecordKind, RecordQuery, UpdateRecord},
    routes::{effective_owner, ensure_readable, ok},
};

/// Paginated list response
#[derive(Serialize)]
pub struct RecordListResponse {
    pub items: Vec<OwnedRecord>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/records/:kind", get(list_records))
        .route("/api/records/:kind", post(create_record))
        .route("/api/records/:kind/:id", put(update_record))
        .route("/api/records/:kind/:id", delete(delete_record))
        .route("/api/records/:kind/:id/attachment", post(upload_attachment))
}

fn parse_kind(kind: &str) -> ApiResult<RecordKind> {
    kind.parse()
        .map_err(|e: String| ApiError::Validation(e))
}

/// List records with pagination and search
pub async fn list_records(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(kind): Path<String>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    ensure_readable(&session, kind)?;

    let owner = effective_owner(&session);
    let (items, total) = state.records.list(kind, owner, &query).await?;

    let response = RecordListResponse {
        items,
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(10).clamp(1, 100),
        total,
    };

    Ok(ok(response))
}

/// Create a record owned by the caller
pub async fn create_record(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(kind): Path<String>,
    Json(payload): Json<NewRecord>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    session.require_write()?;

    let record = state
        .records
        .create(kind, session.account_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, ok(record)))
}

/// Replace a record's payload
pub async fn update_record(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateRecord>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    session.require_write()?;

    let record = state
        .records
        .update(kind, id, session.account_id, &payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ok(record))
}

/// Delete a record; its attachment is cleaned up best-effort afterwards
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    session.require_write()?;

    let attachment_url = state
        .records
        .delete(kind, id, session.account_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(url) = attachment_url {
        state.storage.remove_by_url(&url).await;
    }

    Ok(ok(json!({"deleted": true})))
}

/// Attach an uploaded file to a record, replacing any previous attachment
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path((kind, id)): Path<(String, Uuid)>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    session.require_write()?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?
        .ok_or_else(|| ApiError::Validation("No file in upload".to_string()))?;

    let file_name = field
        .file_name()
        .map(|name| name.to_string())
        .ok_or_else(|| ApiError::Validation("Upload is missing a file name".to_string()))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;

    // The row must exist and belong to the caller before anything is
    // uploaded.
    state
        .records
        .find_owned(kind, id, session.account_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let url = state
        .storage
        .store(kind.bucket(), session.account_id, &file_name, bytes.to_vec())
        .await?;

    let previous = state
        .records
        .set_attachment(kind, id, session.account_id, &url)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Replacing an attachment leaves the old object behind; clean it up
    // best-effort.
    if let Some(previous_url) = previous {
        state.storage.remove_by_url(&previous_url).await;
    }

    Ok(ok(json!({"attachment_url": url})))
}
