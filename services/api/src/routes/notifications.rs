//! Notification inbox routes
//!
//! The inbox is poll-based: the client re-fetches on a fixed interval and
//! marks everything read when it closes the panel, so unread badges persist
//! while browsing.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
    models::{NotificationType, VerifyAction},
    routes::{current_user, ok},
};

/// Request acting on a pending approval notification
#[derive(Deserialize)]
pub struct NotificationActionRequest {
    pub notification_id: Uuid,
    pub action: VerifyAction,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/:id", delete(delete_notification))
        .route("/api/nominee-request-action", post(request_action))
}

/// List the caller's notifications, most recent first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state
        .notifications
        .list_for_user(session.account_id)
        .await?;
    Ok(ok(notifications))
}

/// Mark every unread notification read; invoked when the inbox closes
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .notifications
        .mark_all_read(session.account_id)
        .await?;
    Ok(ok(json!({"updated": updated})))
}

/// Remove a single notification. Idempotent: deleting an absent row
/// reports rather than fails.
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state
        .notifications
        .delete(id, session.account_id)
        .await?;
    Ok(ok(json!({"deleted": deleted})))
}

/// Resolve a trustee approval request from the inbox, then mark the
/// notification read
pub async fn request_action(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<NotificationActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &session).await?;

    let notification = state
        .notifications
        .find_for_recipient(payload.notification_id, user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if notification.notification_type != NotificationType::NomineeRequest {
        return Err(ApiError::Validation(
            "Notification does not carry an approval request".to_string(),
        ));
    }

    state
        .invitations
        .resolve_approval(&user, &notification.payload, payload.action)
        .await?;

    state.notifications.mark_read(notification.id).await?;

    Ok(ok(json!({"resolved": true})))
}
