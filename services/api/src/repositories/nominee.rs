//! Nominee repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{InvitationStatus, NewNominee, Nominee, RoleName};

/// Nominee repository
#[derive(Clone)]
pub struct NomineeRepository {
    pool: PgPool,
}

const NOMINEE_COLUMNS: &str = "id, user_id, name, email, relationship, phone, access_categories, \
     invitation_token, invitation_status, invitation_sent_at, invitation_responded_at, \
     created_at, updated_at";

impl NomineeRepository {
    /// Create a new nominee repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Nominee> {
        let status: String = row.get("invitation_status");
        Ok(Nominee {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            email: row.get("email"),
            relationship: row.get("relationship"),
            phone: row.get("phone"),
            access_categories: row.get("access_categories"),
            invitation_token: row.get("invitation_token"),
            invitation_status: status.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            invitation_sent_at: row.get("invitation_sent_at"),
            invitation_responded_at: row.get("invitation_responded_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// List nominees owned by an account, newest first
    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Nominee>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOMINEE_COLUMNS} FROM nominees WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    /// Find a nominee scoped to its owner
    pub async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Nominee>> {
        let row = sqlx::query(&format!(
            "SELECT {NOMINEE_COLUMNS} FROM nominees WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Find a nominee by its current invitation token
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Nominee>> {
        let row = sqlx::query(&format!(
            "SELECT {NOMINEE_COLUMNS} FROM nominees WHERE invitation_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Find the nominee record matching an invitee email under an owner.
    /// Used to resolve the access scope when switching into nominee mode.
    pub async fn find_by_email_and_owner(
        &self,
        email: &str,
        owner_id: Uuid,
    ) -> Result<Option<Nominee>> {
        let row = sqlx::query(&format!(
            "SELECT {NOMINEE_COLUMNS} FROM nominees \
             WHERE lower(email) = lower($1) AND user_id = $2"
        ))
        .bind(email)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Insert a new nominee with a pending invitation
    pub async fn create(
        &self,
        owner_id: Uuid,
        new_nominee: &NewNominee,
        token: &str,
    ) -> Result<Nominee> {
        info!("Creating nominee for owner {}", owner_id);

        let row = sqlx::query(&format!(
            "INSERT INTO nominees \
                 (user_id, name, email, relationship, phone, access_categories, \
                  invitation_token, invitation_status, invitation_sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', now()) \
             RETURNING {NOMINEE_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&new_nominee.name)
        .bind(&new_nominee.email)
        .bind(&new_nominee.relationship)
        .bind(&new_nominee.phone)
        .bind(&new_nominee.access_categories)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Self::map_row(&row)
    }

    /// Write back the mutable fields of a nominee, including its invitation
    /// state. Scoped to the owner; last write wins.
    pub async fn update(&self, nominee: &Nominee) -> Result<Option<Nominee>> {
        let row = sqlx::query(&format!(
            "UPDATE nominees SET \
                 name = $3, email = $4, relationship = $5, phone = $6, \
                 access_categories = $7, invitation_token = $8, \
                 invitation_status = $9, invitation_sent_at = $10, \
                 invitation_responded_at = $11, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {NOMINEE_COLUMNS}"
        ))
        .bind(nominee.id)
        .bind(nominee.user_id)
        .bind(&nominee.name)
        .bind(&nominee.email)
        .bind(&nominee.relationship)
        .bind(&nominee.phone)
        .bind(&nominee.access_categories)
        .bind(&nominee.invitation_token)
        .bind(nominee.invitation_status.as_str())
        .bind(nominee.invitation_sent_at)
        .bind(nominee.invitation_responded_at)
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
            "UPDATE nominees SET invitation_status = $2, invitation_responded_at = $3, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(responded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a nominee together with its notifications and role
    /// assignment in a single transaction, so a partial failure cannot
    /// orphan rows. Returns the deleted record, or None when it does not
    /// exist under this owner.
    pub async fn delete_cascade(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Nominee>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM nominees WHERE id = $1 AND user_id = $2 RETURNING {NOMINEE_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let nominee = Self::map_row(&row)?;

        sqlx::query("DELETE FROM notifications WHERE payload->>'nominee_id' = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM user_roles \
             WHERE role = $1 AND related_user_id = $2 \
               AND user_id IN (SELECT id FROM users WHERE email = lower($3))",
        )
        .bind(RoleName::Nominee.as_str())
        .bind(owner_id)
        .bind(&nominee.email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Deleted nominee {} and its related rows", id);
        Ok(Some(nominee))
    }
}
