//! Membership repository
//!
//! The `user_segments` join table is written only through set-based bulk
//! statements inside a transaction:
//! - insert: `UNNEST` + `ON CONFLICT DO NOTHING` (already a member is fine)
//! - delete: `= ANY($2)` (already gone is fine)
//!
//! Existence of the user and every referenced segment is checked first, so
//! a bad reference rolls the whole call back before anything is written.

use std::collections::BTreeSet;

use sqlx::{PgConnection, PgPool};

use segmentctl_core::{reconcile, MembershipPlan, MembershipRequest, SegmentName};

use super::{violated_foreign_key, violating_key};
use crate::store::{first_missing, StoreError};

/// Membership repository
pub struct MembershipRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MembershipRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current segment names of a user.
    pub async fn user_segments(&self, user_id: i64) -> Result<BTreeSet<String>, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, user_id).await?;
        let current = current_segments(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(current)
    }

    /// Write a precomputed plan atomically.
    pub async fn apply(&self, user_id: i64, plan: &MembershipPlan) -> Result<(), StoreError> {
        let referenced: BTreeSet<String> = plan.to_add.union(&plan.to_remove).cloned().collect();

        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, user_id).await?;
        ensure_segments(&mut tx, &referenced).await?;
        write_plan(&mut tx, user_id, plan).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reconcile a request against the membership read in the same transaction.
    ///
    /// Dropping `tx` on any early return rolls back.
    pub async fn reconcile(
        &self,
        user_id: i64,
        request: &MembershipRequest,
    ) -> Result<MembershipPlan, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, user_id).await?;
        ensure_segments(&mut tx, &request.referenced()).await?;

        let current = current_segments(&mut tx, user_id).await?;
        let plan = reconcile(&current, request);

        if !plan.is_empty() {
            write_plan(&mut tx, user_id, &plan).await?;
        }
        tx.commit().await?;

        tracing::info!(
            user_id,
            added = plan.to_add.len(),
            removed = plan.to_remove.len(),
            cancelled = request.cancelled().len(),
            "reconciled user segments"
        );
        Ok(plan)
    }

    pub async fn add(&self, segment: &SegmentName, user_id: i64) -> Result<(), StoreError> {
        let plan = MembershipPlan {
            to_add: BTreeSet::from([segment.to_string()]),
            ..Default::default()
        };
        self.apply(user_id, &plan).await
    }

    pub async fn remove(&self, segment: &SegmentName, user_id: i64) -> Result<(), StoreError> {
        let plan = MembershipPlan {
            to_remove: BTreeSet::from([segment.to_string()]),
            ..Default::default()
        };
        self.apply(user_id, &plan).await
    }
}

async fn ensure_user(conn: &mut PgConnection, user_id: i64) -> Result<(), StoreError> {
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    if !exists.0 {
        return Err(StoreError::UserNotFound(user_id));
    }
    Ok(())
}

async fn ensure_segments(
    conn: &mut PgConnection,
    names: &BTreeSet<String>,
) -> Result<(), StoreError> {
    if names.is_empty() {
        return Ok(());
    }

    let names_vec: Vec<String> = names.iter().cloned().collect();
    let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM segments WHERE name = ANY($1)")
        .bind(&names_vec)
        .fetch_all(&mut *conn)
        .await?;

    let existing: BTreeSet<String> = existing.into_iter().collect();
    match first_missing(names, &existing) {
        Some(name) => Err(StoreError::SegmentNotFound(name.clone())),
        None => Ok(()),
    }
}

async fn current_segments(
    conn: &mut PgConnection,
    user_id: i64,
) -> Result<BTreeSet<String>, StoreError> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT segment_name FROM user_segments WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(names.into_iter().collect())
}

async fn write_plan(
    conn: &mut PgConnection,
    user_id: i64,
    plan: &MembershipPlan,
) -> Result<(), StoreError> {
    if !plan.to_add.is_empty() {
        let names: Vec<String> = plan.to_add.iter().cloned().collect();
        let inserted = sqlx::query(
            r#"
            INSERT INTO user_segments (user_id, segment_name)
            SELECT $1, name FROM UNNEST($2::text[]) AS t(name)
            ON CONFLICT (user_id, segment_name) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&names)
        .execute(&mut *conn)
        .await
        .map_err(|e| foreign_key_as_not_found(e, user_id, &names))?
        .rows_affected();

        if inserted < names.len() as u64 {
            tracing::debug!(
                user_id,
                skipped = names.len() as u64 - inserted,
                "memberships already present"
            );
        }
    }

    if !plan.to_remove.is_empty() {
        let names: Vec<String> = plan.to_remove.iter().cloned().collect();
        let deleted = sqlx::query(
            "DELETE FROM user_segments WHERE user_id = $1 AND segment_name = ANY($2)",
        )
        .bind(user_id)
        .bind(&names)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if deleted < names.len() as u64 {
            tracing::debug!(
                user_id,
                skipped = names.len() as u64 - deleted,
                "memberships already absent"
            );
        }
    }

    Ok(())
}

/// A parent row deleted by a concurrent call between check and insert.
fn foreign_key_as_not_found(err: sqlx::Error, user_id: i64, names: &[String]) -> StoreError {
    let constraint = violated_foreign_key(&err).map(str::to_owned);
    match constraint.as_deref() {
        Some("user_segments_user_fk") => StoreError::UserNotFound(user_id),
        Some("user_segments_segment_fk") => {
            let name = violating_key(&err)
                .or_else(|| names.first().cloned())
                .unwrap_or_default();
            StoreError::SegmentNotFound(name)
        }
        _ => StoreError::Unavailable(err),
    }
}
