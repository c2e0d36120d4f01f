//! Segment repository
//!
//! Segments are keyed by name and never renamed, so there is no update.

use sqlx::PgPool;

use segmentctl_core::SegmentName;

use crate::store::{Segment, SegmentWithCount, StoreError, User};

/// Segment repository
pub struct SegmentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SegmentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a segment; an existing name is a conflict.
    pub async fn create(&self, name: SegmentName) -> Result<Segment, StoreError> {
        sqlx::query_as::<_, Segment>(
            r#"
            INSERT INTO segments (name) VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING name, created_at
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StoreError::AlreadyExists {
            resource: "segment",
            id: name.into_string(),
        })
    }

    /// Get a single segment with its member count.
    pub async fn get(&self, name: &SegmentName) -> Result<SegmentWithCount, StoreError> {
        sqlx::query_as::<_, SegmentWithCount>(
            r#"
            SELECT
                s.name,
                s.created_at,
                COUNT(us.user_id) AS member_count
            FROM segments s
            LEFT JOIN user_segments us ON us.segment_name = s.name
            WHERE s.name = $1
            GROUP BY s.name, s.created_at
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StoreError::SegmentNotFound(name.to_string()))
    }

    /// List segments with member counts (single query, no N+1).
    pub async fn list(&self) -> Result<Vec<SegmentWithCount>, StoreError> {
        let segments = sqlx::query_as::<_, SegmentWithCount>(
            r#"
            SELECT
                s.name,
                s.created_at,
                COUNT(us.user_id) AS member_count
            FROM segments s
            LEFT JOIN user_segments us ON us.segment_name = s.name
            GROUP BY s.name, s.created_at
            ORDER BY s.name
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(segments)
    }

    /// Delete a segment. Memberships are removed by `ON DELETE CASCADE`.
    pub async fn delete(&self, name: &SegmentName) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM segments WHERE name = $1")
            .bind(name.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SegmentNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Members of a segment, ordered by user id.
    pub async fn users(&self, name: &SegmentName) -> Result<Vec<User>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM segments WHERE name = $1)")
            .bind(name.as_str())
            .fetch_one(&mut *tx)
            .await?;

        if !exists.0 {
            return Err(StoreError::SegmentNotFound(name.to_string()));
        }

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.firstname, u.lastname, u.username, u.created_at
            FROM users u
            JOIN user_segments us ON us.user_id = u.id
            WHERE us.segment_name = $1
            ORDER BY u.id
            "#,
        )
        .bind(name.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(users)
    }
}
