//! Notification repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Notification, NotificationType};

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Notification> {
        let ty: String = row.get("notification_type");
        Ok(Notification {
            id: row.get("id"),
            user_id: row.get("user_id"),
            notification_type: ty.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            payload: row.get("payload"),
            read: row.get("read"),
            created_at: row.get("created_at"),
        })
    }

    /// Create a notification addressed to an account
    pub async fn create(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        payload: serde_json::Value,
    ) -> Result<Notification> {
        info!("Creating {} notification for {}", notification_type, user_id);

        let row = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, notification_type, payload)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, notification_type, payload, read, created_at
            "#,
        )
        .bind(user_id)
        .bind(notification_type.as_str())
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Self::map_row(&row)
    }

    /// List all notifications addressed to an account, most recent first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, notification_type, payload, read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    /// Find a notification scoped to its recipient
    pub async fn find_for_recipient(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Notification>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, notification_type, payload, read, created_at
            FROM notifications
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    /// Mark every unread notification for an account as read
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark a single notification as read
    pub async fn mark_read(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a notification scoped to its recipient. Idempotent: deleting
    /// an absent row is reported, not an error.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if !deleted {
            info!("Notification {} already absent, nothing to delete", id);
        }
        Ok(deleted)
    }
}
