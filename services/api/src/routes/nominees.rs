//! Nominee routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    middleware::AuthSession,
    models::{NewNominee, UpdateNominee, VerifyAction},
    routes::{current_user, ok},
};

/// Request resolving a verification token
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
    pub action: VerifyAction,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/nominees", get(list_nominees))
        .route("/api/nominees", post(create_nominee))
        .route("/api/nominees/:id", put(update_nominee))
        .route("/api/nominees/:id", delete(delete_nominee))
        .route("/api/nominees/:id/resend", post(resend_invitation))
        .route("/api/verify-nominee", post(verify))
}

/// List the caller's nominees
pub async fn list_nominees(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let nominees = state.nominees.list_for_owner(session.account_id).await?;
    Ok(ok(nominees))
}

/// Add a nominee and issue its invitation
pub async fn create_nominee(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<NewNominee>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    let nominee = state.invitations.issue_nominee(&user, payload).await?;
    Ok((StatusCode::CREATED, ok(nominee)))
}

/// Update a nominee; an email change re-invites under a fresh token
pub async fn update_nominee(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNominee>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    let nominee = state.invitations.update_nominee(&user, id, payload).await?;
    Ok(ok(nominee))
}

/// Delete a nominee and everything hanging off it
pub async fn delete_nominee(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    state.invitations.delete_nominee(&user, id).await?;
    Ok(ok(json!({"deleted": true})))
}

/// Re-send a nominee invitation
pub async fn resend_invitation(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    let nominee = state.invitations.resend_nominee(&user, id).await?;
    Ok(ok(nominee))
}

/// Resolve a verification token on behalf of the authenticated caller
pub async fn verify(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<VerifyRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &session).await?;
    let outcome = state
        .invitations
        .verify(&user, &payload.token, payload.action)
        .await?;
    Ok(ok(outcome))
}
