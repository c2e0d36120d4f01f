//! Store traits and records
//!
//! The HTTP layer talks to an `Arc<dyn Store>`:
//! - [`crate::db::PgStore`]: PostgreSQL via sqlx
//! - [`MemoryStore`]: in-process, for tests and `serve --in-memory`
//!
//! Both give the same guarantees: membership changes are atomic, duplicate
//! inserts and missing deletes are absorbed, and a missing user or segment
//! fails the whole call without writing anything.

pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use segmentctl_core::{MembershipPlan, MembershipRequest, SegmentName, UserFields};

pub use memory::MemoryStore;

/// User record
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// User with its segment names (sorted)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserWithSegments {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub segments: Vec<String>,
}

/// Segment record
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Segment {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Segment with member count for list display
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SegmentWithCount {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("segment '{0}' not found")]
    SegmentNotFound(String),

    #[error("{resource} '{id}' already exists")]
    AlreadyExists { resource: &'static str, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, fields: UserFields) -> Result<User, StoreError>;

    async fn get_user(&self, id: i64) -> Result<UserWithSegments, StoreError>;

    async fn list_users(&self) -> Result<Vec<UserWithSegments>, StoreError>;

    async fn update_user(&self, id: i64, fields: UserFields) -> Result<User, StoreError>;

    /// Delete a user; its memberships go with it.
    async fn delete_user(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SegmentStore: Send + Sync {
    async fn create_segment(&self, name: SegmentName) -> Result<Segment, StoreError>;

    async fn get_segment(&self, name: &SegmentName) -> Result<SegmentWithCount, StoreError>;

    async fn list_segments(&self) -> Result<Vec<SegmentWithCount>, StoreError>;

    /// Delete a segment; its memberships go with it.
    async fn delete_segment(&self, name: &SegmentName) -> Result<(), StoreError>;

    /// Members of a segment, ordered by user id.
    async fn segment_users(&self, name: &SegmentName) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Current segment names of a user.
    async fn user_segments(&self, user_id: i64) -> Result<BTreeSet<String>, StoreError>;

    /// Write an already computed plan in one transaction.
    ///
    /// Rows that already exist are skipped and rows that are already gone are
    /// ignored. Fails with `UserNotFound` / `SegmentNotFound` before writing.
    async fn apply_membership_change(
        &self,
        user_id: i64,
        plan: &MembershipPlan,
    ) -> Result<(), StoreError>;

    /// Read current membership, reconcile `request` against it and write the
    /// result, all in one transaction. Returns the plan that was applied.
    async fn update_user_segments(
        &self,
        user_id: i64,
        request: &MembershipRequest,
    ) -> Result<MembershipPlan, StoreError>;

    async fn add_membership(&self, segment: &SegmentName, user_id: i64) -> Result<(), StoreError>;

    async fn remove_membership(
        &self,
        segment: &SegmentName,
        user_id: i64,
    ) -> Result<(), StoreError>;
}

/// Everything the HTTP layer needs
pub trait Store: UserStore + SegmentStore + MembershipStore {}

impl<T> Store for T where T: UserStore + SegmentStore + MembershipStore {}

/// First name of `referenced` that is not in `existing`.
pub(crate) fn first_missing<'a>(
    referenced: &'a BTreeSet<String>,
    existing: &BTreeSet<String>,
) -> Option<&'a String> {
    referenced.iter().find(|name| !existing.contains(*name))
}
