//! Trustee repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{InvitationStatus, NewTrustee, RoleName, Trustee};

/// Trustee repository
#[derive(Clone)]
pub struct TrusteeRepository {
    pool: PgPool,
}

const TRUSTEE_COLUMNS: &str = "id, user_id, name, email, relationship, phone, approval_type, \
     invitation_token, invitation_status, invitation_sent_at, invitation_responded_at, \
     created_at, updated_at";

impl TrusteeRepository {
    /// Create a new trustee repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Trustee> {
        let status: String = row.get("invitation_status");
        let approval: String = row.get("approval_type");
        Ok(Trustee {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            email: row.get("email"),
            relationship: row.get("relationship"),
            phone: row.get("phone"),
            approval_type: approval.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            invitation_token: row.get("invitation_token"),
            invitation_status: status.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            invitation_sent_at: row.get("invitation_sent_at"),
            invitation_responded_at: row.get("invitation_responded_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// List trustees owned by an account, newest first
    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Trustee>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRUSTEE_COLUMNS} FROM trustees WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    /// Find a trustee scoped to its owner
    pub async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Trustee>> {
        let row = sqlx::query(&format!(
            "SELECT {TRUSTEE_COLUMNS} FROM trustees WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Find a trustee by id alone. Used when resolving a secondary-approval
    /// notification addressed to the record's owner.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Trustee>> {
        let row = sqlx::query(&format!(
            "SELECT {TRUSTEE_COLUMNS} FROM trustees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Find a trustee by its current invitation token
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Trustee>> {
        let row = sqlx::query(&format!(
            "SELECT {TRUSTEE_COLUMNS} FROM trustees WHERE invitation_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Insert a new trustee with a pending invitation
    pub async fn create(
        &self,
        owner_id: Uuid,
        new_trustee: &NewTrustee,
        token: &str,
    ) -> Result<Trustee> {
        info!("Creating trustee for owner {}", owner_id);

        let row = sqlx::query(&format!(
            "INSERT INTO trustees \
                 (user_id, name, email, relationship, phone, approval_type, \
                  invitation_token, invitation_status, invitation_sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', now()) \
             RETURNING {TRUSTEE_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&new_trustee.name)
        .bind(&new_trustee.email)
        .bind(&new_trustee.relationship)
        .bind(&new_trustee.phone)
        .bind(new_trustee.approval_type.as_str())
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Self::map_row(&row)
    }

    /// Write back the mutable fields of a trustee, including its invitation
    /// state. Scoped to the owner; last write wins.
    pub async fn update(&self, trustee: &Trustee) -> Result<Option<Trustee>> {
        let row = sqlx::query(&format!(
            "UPDATE trustees SET \
                 name = $3, email = $4, relationship = $5, phone = $6, \
                 approval_type = $7, invitation_token = $8, \
                 invitation_status = $9, invitation_sent_at = $10, \
                 invitation_responded_at = $11, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {TRUSTEE_COLUMNS}"
        ))
        .bind(trustee.id)
        .bind(trustee.user_id)
        .bind(&trustee.name)
        .bind(&trustee.email)
        .bind(&trustee.relationship)
        .bind(&trustee.phone)
        .bind(trustee.approval_type.as_str())
        .bind(&trustee.invitation_token)
        .bind(trustee.invitation_status.as_str())
        .bind(trustee.invitation_sent_at)
        .bind(trustee.invitation_responded_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Record the invitee's response to a pending invitation
    pub async fn record_response(
        &self,
        id: Uuid,
        status: InvitationStatus,
        responded_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE trustees SET invitation_status = $2, invitation_responded_at = $3, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(responded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a trustee together with its notifications and role assignment
    /// in a single transaction. Returns the deleted record, or None when it
    /// does not exist under this owner.
    pub async fn delete_cascade(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Trustee>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM trustees WHERE id = $1 AND user_id = $2 RETURNING {TRUSTEE_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let trustee = Self::map_row(&row)?;

        sqlx::query("DELETE FROM notifications WHERE payload->>'trustee_id' = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM user_roles \
             WHERE role = $1 AND related_user_id = $2 \
               AND user_id IN (SELECT id FROM users WHERE email = lower($3))",
        )
        .bind(RoleName::Trustee.as_str())
        .bind(owner_id)
        .bind(&trustee.email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Deleted trustee {} and its related rows", id);
        Ok(Some(trustee))
    }
}
