//! Authentication middleware
//!
//! Validates the identity token (session cookie first, `Authorization:
//! Bearer` as fallback), rejects blacklisted tokens, and injects an
//! [`AuthSession`] into request extensions. The acting-role selection is
//! re-read from the server-side session store on every request rather than
//! trusted from the client.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, error::ApiError, jwt::TokenType, models::RoleSelection};

/// Name of the session cookie carrying the access token
pub const SESSION_COOKIE: &str = "lk_session";

/// The authenticated caller, as seen by every handler behind the
/// middleware
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account_id: Uuid,
    /// The role the account is currently acting as
    pub role: RoleSelection,
}

impl AuthSession {
    /// Centralized write gate: every mutating handler calls this instead of
    /// comparing role names ad hoc.
    pub fn require_write(&self) -> Result<(), ApiError> {
        if self.role.can_write() {
            Ok(())
        } else {
            Err(ApiError::ReadOnlyRole)
        }
    }
}

/// Extract and validate the identity token, then attach an [`AuthSession`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&req).ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .jwt_service
        .validate_token(&token)
        .map_err(|_| ApiError::Unauthenticated)?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthenticated);
    }

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, &token)
        .await
        .map_err(|e| {
            error!("Failed to check token blacklist: {}", e);
            ApiError::Upstream(e)
        })?;

    if is_blacklisted {
        return Err(ApiError::Unauthenticated);
    }

    let role = state
        .session_manager
        .role_selection(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load role selection: {}", e);
            ApiError::Upstream(e)
        })?;

    req.extensions_mut().insert(AuthSession {
        account_id: claims.sub,
        role,
    });

    Ok(next.run(req).await)
}

/// Session cookie first, Authorization header as fallback
fn extract_token(req: &Request<Body>) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleName;

    fn session_with(role: RoleName) -> AuthSession {
        AuthSession {
            account_id: Uuid::new_v4(),
            role: RoleSelection {
                role,
                related_user_id: None,
                access_categories: Vec::new(),
            },
        }
    }

    #[test]
    fn test_nominee_session_cannot_write() {
        let err = session_with(RoleName::Nominee)
            .require_write()
            .expect_err("nominee sessions are read-only");
        assert!(matches!(err, ApiError::ReadOnlyRole));
    }

    #[test]
    fn test_owner_and_trustee_sessions_can_write() {
        assert!(session_with(RoleName::Owner).require_write().is_ok());
        assert!(session_with(RoleName::Trustee).require_write().is_ok());
    }

    #[test]
    fn test_extract_token_prefers_cookie() {
        let req = Request::builder()
            .header("cookie", format!("{}=cookie-token", SESSION_COOKIE))
            .header("authorization", "Bearer header-token")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_token(&req), Some("cookie-token".to_string()));
    }

    #[test]
    fn test_extract_token_falls_back_to_bearer() {
        let req = Request::builder()
            .header("authorization", "Bearer header-token")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_token(&req), Some("header-token".to_string()));
    }

    #[test]
    fn test_extract_token_absent() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_token(&req), None);
    }
}
