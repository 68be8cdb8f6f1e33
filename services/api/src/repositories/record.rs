//! Uniform repository over the owned domain record tables
//!
//! All eight domain tables share one shape, so a single repository serves
//! them, parameterized by [`RecordKind`]. Table names are interpolated from
//! the closed enum, never from request input.

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{NewRecord, OwnedRecord, RecordKind, RecordQuery, UpdateRecord};

/// Domain record repository
#[derive(Clone)]
pub struct RecordRepository {
    pool: PgPool,
}

impl RecordRepository {
    /// Create a new record repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> OwnedRecord {
        OwnedRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            data: row.get("data"),
            attachment_url: row.get("attachment_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// List records owned by an account with pagination and an optional
    /// substring filter over the payload text
    pub async fn list(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        query: &RecordQuery,
    ) -> Result<(Vec<OwnedRecord>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) as i64 * limit as i64;
        let search = query
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.to_lowercase()));
        let table = kind.table();

        let rows = sqlx::query(&format!(
            "SELECT id, user_id, data, attachment_url, created_at, updated_at \
             FROM {table} \
             WHERE user_id = $1 AND ($2::text IS NULL OR lower(data::text) LIKE $2) \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(&search)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {table} \
             WHERE user_id = $1 AND ($2::text IS NULL OR lower(data::text) LIKE $2)"
        ))
        .bind(user_id)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.iter().map(Self::map_row).collect(), count))
    }

    /// Find a record scoped to its owner
    pub async fn find_owned(
        &self,
        kind: RecordKind,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OwnedRecord>> {
        let row = sqlx::query(&format!(
            "SELECT id, user_id, data, attachment_url, created_at, updated_at \
             FROM {} WHERE id = $1 AND user_id = $2",
            kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// Insert a new record
    pub async fn create(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        new_record: &NewRecord,
    ) -> Result<OwnedRecord> {
        let row = sqlx::query(&format!(
            "INSERT INTO {} (user_id, data) VALUES ($1, $2) \
             RETURNING id, user_id, data, attachment_url, created_at, updated_at",
            kind.table()
        ))
        .bind(user_id)
        .bind(&new_record.data)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::map_row(&row))
    }

    /// Replace a record's payload, scoped to its owner
    pub async fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        user_id: Uuid,
        update: &UpdateRecord,
    ) -> Result<Option<OwnedRecord>> {
        let row = sqlx::query(&format!(
            "UPDATE {} SET data = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, data, attachment_url, created_at, updated_at",
            kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .bind(&update.data)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// Point a record at a new attachment, returning the previous URL so
    /// the caller can clean up the old object best-effort
    pub async fn set_attachment(
        &self,
        kind: RecordKind,
        id: Uuid,
        user_id: Uuid,
        url: &str,
    ) -> Result<Option<Option<String>>> {
        let row = sqlx::query(&format!(
            "UPDATE {} t SET attachment_url = $3, updated_at = now() \
             FROM (SELECT id, attachment_url FROM {} WHERE id = $1 AND user_id = $2 FOR UPDATE) prev \
             WHERE t.id = prev.id \
             RETURNING prev.attachment_url AS previous_url",
            kind.table(),
            kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("previous_url")))
    }

    /// Delete a record scoped to its owner, returning its attachment URL
    /// (if any) for best-effort storage cleanup
    pub async fn delete(
        &self,
        kind: RecordKind,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Option<String>>> {
        let row = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2 RETURNING attachment_url",
            kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("attachment_url")))
    }
}
