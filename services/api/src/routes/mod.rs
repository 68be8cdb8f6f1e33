//! API service routes

use axum::{Json, Router, middleware, response::IntoResponse, routing::get};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthSession, auth_middleware},
    models::{RecordKind, RoleName, User},
};

pub mod auth;
pub mod nominees;
pub mod notifications;
pub mod records;
pub mod requests;
pub mod roles;
pub mod trustees;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .merge(roles::router())
        .merge(nominees::router())
        .merge(trustees::router())
        .merge(notifications::router())
        .merge(records::router())
        .merge(requests::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth::public_router())
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "legacy-keeper-api"
    }))
}

/// Uniform success envelope
pub(crate) fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// Load the caller's account row. A valid token whose account has vanished
/// is treated as an unauthenticated session.
pub(crate) async fn current_user(state: &AppState, session: &AuthSession) -> ApiResult<User> {
    state
        .users
        .find_by_id(session.account_id)
        .await?
        .ok_or(ApiError::Unauthenticated)
}

/// The account whose rows the session is reading: the related owner when
/// acting as nominee/trustee, otherwise the caller itself
pub(crate) fn effective_owner(session: &AuthSession) -> Uuid {
    session
        .role
        .related_user_id
        .unwrap_or(session.account_id)
}

/// Gate reads on the nominee access scope: a nominee session only sees the
/// categories it was granted. Owner and trustee sessions see everything
/// they own.
pub(crate) fn ensure_readable(session: &AuthSession, kind: RecordKind) -> ApiResult<()> {
    if session.role.role == RoleName::Nominee
        && !session
            .role
            .access_categories
            .iter()
            .any(|category| category == kind.slug())
    {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleSelection;

    fn session(role: RoleName, related: Option<Uuid>, scope: Vec<String>) -> AuthSession {
        AuthSession {
            account_id: Uuid::new_v4(),
            role: RoleSelection {
                role,
                related_user_id: related,
                access_categories: scope,
            },
        }
    }

    #[test]
    fn test_effective_owner_follows_related_account() {
        let owner_id = Uuid::new_v4();
        let s = session(RoleName::Nominee, Some(owner_id), vec![]);
        assert_eq!(effective_owner(&s), owner_id);

        let s = session(RoleName::Owner, None, vec![]);
        assert_eq!(effective_owner(&s), s.account_id);
    }

    #[test]
    fn test_nominee_reads_only_granted_categories() {
        let s = session(
            RoleName::Nominee,
            Some(Uuid::new_v4()),
            vec!["reminders".to_string()],
        );
        assert!(ensure_readable(&s, RecordKind::Reminders).is_ok());
        assert!(matches!(
            ensure_readable(&s, RecordKind::DebtsLoans),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn test_empty_scope_reads_nothing() {
        let s = session(RoleName::Nominee, Some(Uuid::new_v4()), vec![]);
        for kind in RecordKind::ALL {
            assert!(ensure_readable(&s, kind).is_err());
        }
    }

    #[test]
    fn test_owner_reads_everything() {
        let s = session(RoleName::Owner, None, vec![]);
        for kind in RecordKind::ALL {
            assert!(ensure_readable(&s, kind).is_ok());
        }
    }
}
