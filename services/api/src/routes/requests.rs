//! Inter-user request routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
    models::{NewRequest, UpdateRequest},
    routes::{current_user, ok},
    validation::validate_email,
};

/// Request update payload, addressed by id
#[derive(Deserialize)]
pub struct UpdateRequestPayload {
    pub id: Uuid,
    #[serde(flatten)]
    pub update: UpdateRequest,
}

/// Status change payload
#[derive(Deserialize)]
pub struct UpdateStatusPayload {
    pub id: Uuid,
    pub status: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/requests", get(list_requests))
        .route("/api/requests/create", post(create_request))
        .route("/api/requests/update", post(update_request))
        .route("/api/requests/update-status", post(update_status))
}

/// List requests the caller sent plus requests addressed to their email
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &session).await?;
    let requests = state.requests.list_for_user(user.id, &user.email).await?;
    Ok(ok(requests))
}

/// Create a request addressed to another user
pub async fn create_request(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<NewRequest>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    validate_email(&payload.recipient_email)?;

    let user = current_user(&state, &session).await?;
    let request = state.requests.create(user.id, &payload).await?;
    Ok((StatusCode::CREATED, ok(request)))
}

/// Update a request's payload; only the sender may edit it
pub async fn update_request(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<UpdateRequestPayload>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;

    let request = state
        .requests
        .update(payload.id, session.account_id, &payload.update)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ok(request))
}

/// Update a request's status; allowed to the sender or the addressed
/// recipient
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<UpdateStatusPayload>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;

    if payload.status.trim().is_empty() {
        return Err(ApiError::Validation("Status is required".to_string()));
    }

    let user = current_user(&state, &session).await?;
    let request = state
        .requests
        .update_status(payload.id, user.id, &user.email, &payload.status)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ok(request))
}
