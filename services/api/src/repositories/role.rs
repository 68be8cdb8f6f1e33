//! Role assignment repository

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{RoleAssignment, RoleName};

/// Repository over the `user_roles` table. Only nominee/trustee standings
/// are stored; the owner role is implicit.
#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<RoleAssignment> {
        let role: String = row.get("role");
        Ok(RoleAssignment {
            id: row.get("id"),
            user_id: row.get("user_id"),
            role: role.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            related_user_id: row.get("related_user_id"),
            created_at: row.get("created_at"),
        })
    }

    /// Grant a standing. Idempotent: re-granting an existing standing is a
    /// no-op.
    pub async fn create_assignment(
        &self,
        user_id: Uuid,
        role: RoleName,
        related_user_id: Uuid,
    ) -> Result<()> {
        info!(
            "Granting {} standing: account {} serving owner {}",
            role, user_id, related_user_id
        );

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, related_user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, role, related_user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(related_user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all standings held by an account
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, role, related_user_id, created_at
            FROM user_roles
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    /// Check whether an account holds a specific standing
    pub async fn has_assignment(
        &self,
        user_id: Uuid,
        role: RoleName,
        related_user_id: Uuid,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM user_roles
            WHERE user_id = $1 AND role = $2 AND related_user_id = $3
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(related_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Revoke the standing granted for an invitee email. Used when the
    /// invitation email changes on an already accepted record.
    pub async fn delete_for_member_email(
        &self,
        role: RoleName,
        related_user_id: Uuid,
        member_email: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE role = $1
              AND related_user_id = $2
              AND user_id IN (SELECT id FROM users WHERE email = lower($3))
            "#,
        )
        .bind(role.as_str())
        .bind(related_user_id)
        .bind(member_email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
