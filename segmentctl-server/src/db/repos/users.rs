//! User repository
//!
//! - create/update: unique username enforced by the DB, mapped to `AlreadyExists`
//! - get/list: segment names aggregated in the same query

use sqlx::PgPool;

use segmentctl_core::UserFields;

use super::conflict_as_exists;
use crate::store::{StoreError, User, UserWithSegments};

/// Shared SELECT for users with their segment names.
const USER_WITH_SEGMENTS: &str = r#"
    SELECT
        u.id,
        u.firstname,
        u.lastname,
        u.username,
        u.created_at,
        COALESCE(
            array_agg(us.segment_name ORDER BY us.segment_name)
                FILTER (WHERE us.segment_name IS NOT NULL),
            ARRAY[]::text[]
        ) AS segments
    FROM users u
    LEFT JOIN user_segments us ON us.user_id = u.id
"#;

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, fields: UserFields) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (firstname, lastname, username)
            VALUES ($1, $2, $3)
            RETURNING id, firstname, lastname, username, created_at
            "#,
        )
        .bind(&fields.firstname)
        .bind(&fields.lastname)
        .bind(&fields.username)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_as_exists(e, "user", &fields.username))
    }

    /// Get a user with its segments.
    pub async fn get(&self, id: i64) -> Result<UserWithSegments, StoreError> {
        let query = format!("{USER_WITH_SEGMENTS} WHERE u.id = $1 GROUP BY u.id");
        sqlx::query_as::<_, UserWithSegments>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StoreError::UserNotFound(id))
    }

    /// List all users with their segments, ordered by id.
    pub async fn list(&self) -> Result<Vec<UserWithSegments>, StoreError> {
        let query = format!("{USER_WITH_SEGMENTS} GROUP BY u.id ORDER BY u.id");
        let users = sqlx::query_as::<_, UserWithSegments>(&query)
            .fetch_all(self.pool)
            .await?;
        Ok(users)
    }

    pub async fn update(&self, id: i64, fields: UserFields) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET firstname = $2, lastname = $3, username = $4
            WHERE id = $1
            RETURNING id, firstname, lastname, username, created_at
            "#,
        )
        .bind(id)
        .bind(&fields.firstname)
        .bind(&fields.lastname)
        .bind(&fields.username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_as_exists(e, "user", &fields.username))?
        .ok_or(StoreError::UserNotFound(id))
    }

    /// Delete a user. Memberships are removed by `ON DELETE CASCADE`.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        Ok(())
    }
}
