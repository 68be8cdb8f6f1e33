//! Trustee routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    middleware::AuthSession,
    models::{NewTrustee, UpdateTrustee},
    routes::{current_user, nominees::VerifyRequest, ok},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trustees", get(list_trustees))
        .route("/api/trustees", post(create_trustee))
        .route("/api/trustees/:id", put(update_trustee))
        .route("/api/trustees/:id", delete(delete_trustee))
        .route("/api/trustees/:id/resend", post(resend_invitation))
        .route("/api/verify-trustee", post(verify))
}

/// List the caller's trustees
pub async fn list_trustees(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let trustees = state.trustees.list_for_owner(session.account_id).await?;
    Ok(ok(trustees))
}

/// Add a trustee and issue its invitation
pub async fn create_trustee(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<NewTrustee>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    let trustee = state.invitations.issue_trustee(&user, payload).await?;
    Ok((StatusCode::CREATED, ok(trustee)))
}

/// Update a trustee; an email change re-invites under a fresh token
pub async fn update_trustee(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTrustee>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    let trustee = state.invitations.update_trustee(&user, id, payload).await?;
    Ok(ok(trustee))
}

/// Delete a trustee and everything hanging off it
pub async fn delete_trustee(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    state.invitations.delete_trustee(&user, id).await?;
    Ok(ok(json!({"deleted": true})))
}

/// Re-send a trustee invitation
pub async fn resend_invitation(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    session.require_write()?;
    let user = current_user(&state, &session).await?;
    let trustee = state.invitations.resend_trustee(&user, id).await?;
    Ok(ok(trustee))
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
