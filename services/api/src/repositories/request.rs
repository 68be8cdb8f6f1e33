//! Inter-user request repository

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{NewRequest, Request, UpdateRequest};

/// Request repository
#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    /// Create a new request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Request {
        Request {
            id: row.get("id"),
            user_id: row.get("user_id"),
            recipient_email: row.get("recipient_email"),
            category: row.get("category"),
            status: row.get("status"),
            data: row.get("data"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Insert a new request
    pub async fn create(&self, sender_id: Uuid, new_request: &NewRequest) -> Result<Request> {
        let row = sqlx::query(
            r#"
            INSERT INTO requests (user_id, recipient_email, category, data)
            VALUES ($1, lower($2), $3, $4)
            RETURNING id, user_id, recipient_email, category, status, data,
                      created_at, updated_at
            "#,
        )
        .bind(sender_id)
        .bind(&new_request.recipient_email)
        .bind(&new_request.category)
        .bind(&new_request.data)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::map_row(&row))
    }

    /// List requests the account sent plus requests addressed to its email,
    /// newest first
    pub async fn list_for_user(&self, user_id: Uuid, email: &str) -> Result<Vec<Request>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, recipient_email, category, status, data,
                   created_at, updated_at
            FROM requests
            WHERE user_id = $1 OR recipient_email = lower($2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    /// Update a request's payload, scoped to its sender
    pub async fn update(
        &self,
        id: Uuid,
        sender_id: Uuid,
        update: &UpdateRequest,
    ) -> Result<Option<Request>> {
        let row = sqlx::query(
            r#"
            UPDATE requests SET
                category = COALESCE($3, category),
                data = COALESCE($4, data),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, recipient_email, category, status, data,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(&update.category)
        .bind(&update.data)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// Update a request's status. Allowed to the sender or the addressed
    /// recipient (matched by email).
    pub async fn update_status(
        &self,
        id: Uuid,
        caller_id: Uuid,
        caller_email: &str,
        status: &str,
    ) -> Result<Option<Request>> {
        let row = sqlx::query(
            r#"
            UPDATE requests SET status = $4, updated_at = now()
            WHERE id = $1 AND (user_id = $2 OR recipient_email = lower($3))
            RETURNING id, user_id, recipient_email, category, status, data,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(caller_id)
        .bind(caller_email)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::map_row))
    }
}
