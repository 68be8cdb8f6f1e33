//! Role switcher routes

use axum::{
    Extension, Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    AppState,
    error::ApiResult,
    middleware::AuthSession,
    role_context::SwitchRoleRequest,
    routes::{current_user, ok},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/roles", get(list_roles))
        .route("/api/set-role", post(set_role))
}

/// List the roles the caller can act as
pub async fn list_roles(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &session).await?;
    let roles = state.role_context.available_roles(&user).await?;
    Ok(ok(roles))
}

/// Switch the acting role
pub async fn set_role(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<SwitchRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &session).await?;
    let selection = state.role_context.switch_to(&user, payload).await?;
    Ok(ok(selection))
}
