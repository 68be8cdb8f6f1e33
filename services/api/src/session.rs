//! Session management using Redis
//!
//! Two pieces of per-account state live here: the refresh-token session
//! and the current acting-role selection. Both are keyed by account id so
//! the cookie never has to be trusted for anything beyond identity.

use anyhow::Result;
use common::cache::RedisPool;
use tracing::info;
use uuid::Uuid;

use crate::jwt::JwtService;
use crate::models::RoleSelection;

/// Session manager for handling user sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
    jwt_service: JwtService,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(redis_pool: RedisPool, jwt_service: JwtService) -> Self {
        Self {
            redis_pool,
            jwt_service,
        }
    }

    fn session_key(account_id: Uuid) -> String {
        format!("session:{}", account_id)
    }

    fn role_key(account_id: Uuid) -> String {
        format!("role:{}", account_id)
    }

    /// Create or refresh a session for an account
    pub async fn create_session(&self, account_id: Uuid, refresh_token: &str) -> Result<()> {
        info!("Creating session for account: {}", account_id);

        self.redis_pool
            .set(
                &Self::session_key(account_id),
                refresh_token,
                Some(self.jwt_service.refresh_token_expiry()),
            )
            .await?;

        Ok(())
    }

    /// Get the stored refresh token for an account
    pub async fn get_session(&self, account_id: Uuid) -> Result<Option<String>> {
        let refresh_token = self.redis_pool.get(&Self::session_key(account_id)).await?;
        Ok(refresh_token)
    }

    /// Delete the session and the role selection for an account
    pub async fn delete_session(&self, account_id: Uuid) -> Result<()> {
        info!("Deleting session for account: {}", account_id);

        self.redis_pool.delete(&Self::session_key(account_id)).await?;
        self.redis_pool.delete(&Self::role_key(account_id)).await?;

        Ok(())
    }

    /// Persist the acting-role selection for an account. Sized well under a
    /// cookie but stored server-side so privileged calls never trust
    /// client-cached scope.
    pub async fn set_role_selection(
        &self,
        account_id: Uuid,
        selection: &RoleSelection,
    ) -> Result<()> {
        let value = serde_json::to_string(selection)?;
        self.redis_pool
            .set(&Self::role_key(account_id), &value, None)
            .await?;
        Ok(())
    }

    /// Load the acting-role selection, defaulting to owner when absent or
    /// unreadable
    pub async fn role_selection(&self, account_id: Uuid) -> Result<RoleSelection> {
        let stored = self.redis_pool.get(&Self::role_key(account_id)).await?;

        let selection = stored
            .and_then(|value| serde_json::from_str(&value).ok())
            .unwrap_or_default();

        Ok(selection)
    }

    /// Get Redis health status
    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}
