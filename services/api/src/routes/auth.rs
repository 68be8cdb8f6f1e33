//! Authentication routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    jwt::TokenType,
    middleware::{AuthSession, SESSION_COOKIE},
    models::{LoginCredentials, NewUser},
    routes::{current_user, ok},
    validation::{validate_email, validate_name, validate_password},
};

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Routes behind the auth middleware
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::Validation(
            "An account with this email already exists".to_string(),
        ));
    }

    let user = state.users.create(&payload).await?;
    info!("Account created: {}", user.id);

    Ok((StatusCode::CREATED, ok(user)))
}

/// Authenticate and open a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for {}", payload.email);

    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !state.users.verify_password(&user, &payload.password)? {
        return Err(ApiError::Unauthenticated);
    }

    let access_token = state.jwt_service.generate_access_token(user.id)?;
    let refresh_token = state.jwt_service.generate_refresh_token(user.id)?;

    state
        .session_manager
        .create_session(user.id, &refresh_token)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let response = TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((jar.add(cookie), ok(response)))
}

/// Close the session: blacklist the refresh token, drop the server-side
/// session state, and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RefreshTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthenticated)?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthenticated);
    }

    state
        .jwt_service
        .revoke_token(&state.redis_pool, &payload.refresh_token)
        .await?;

    // Clearing the cookie does not invalidate the access token it held;
    // blacklist it for its remaining lifetime as well.
    if let Some(access_token) = cookie_access_token(&jar) {
        if let Err(e) = state
            .jwt_service
            .revoke_token(&state.redis_pool, access_token)
            .await
        {
            warn!("Failed to blacklist access token on logout: {}", e);
        }
    }

    state.session_manager.delete_session(claims.sub).await?;

    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    Ok((jar, ok(json!({"message": "Logged out successfully"}))))
}

/// The access token carried by the session cookie, if any
fn cookie_access_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value())
}

/// The caller's account plus its current acting role
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &session).await?;

    Ok(ok(json!({
        "user": user,
        "current_role": session.role,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn test_logout_picks_up_cookie_access_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            format!("{}=cookie-access-token", SESSION_COOKIE)
                .parse()
                .unwrap(),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(cookie_access_token(&jar), Some("cookie-access-token"));
    }

    #[test]
    fn test_no_cookie_means_nothing_to_blacklist() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        assert_eq!(cookie_access_token(&jar), None);
    }
}
