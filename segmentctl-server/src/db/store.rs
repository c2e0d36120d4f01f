//! PostgreSQL-backed [`Store`](crate::store::Store)

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;

use segmentctl_core::{MembershipPlan, MembershipRequest, SegmentName, UserFields};

use super::repos::{MembershipRepo, SegmentRepo, UserRepo};
use crate::store::{
    MembershipStore, Segment, SegmentStore, SegmentWithCount, StoreError, User, UserStore,
    UserWithSegments,
};

/// Store handle wrapping the connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, fields: UserFields) -> Result<User, StoreError> {
        UserRepo::new(&self.pool).create(fields).await
    }

    async fn get_user(&self, id: i64) -> Result<UserWithSegments, StoreError> {
        UserRepo::new(&self.pool).get(id).await
    }

    async fn list_users(&self) -> Result<Vec<UserWithSegments>, StoreError> {
        UserRepo::new(&self.pool).list().await
    }

    async fn update_user(&self, id: i64, fields: UserFields) -> Result<User, StoreError> {
        UserRepo::new(&self.pool).update(id, fields).await
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        UserRepo::new(&self.pool).delete(id).await
    }
}

#[async_trait]
impl SegmentStore for PgStore {
    async fn create_segment(&self, name: SegmentName) -> Result<Segment, StoreError> {
        SegmentRepo::new(&self.pool).create(name).await
    }

    async fn get_segment(&self, name: &SegmentName) -> Result<SegmentWithCount, StoreError> {
        SegmentRepo::new(&self.pool).get(name).await
    }

    async fn list_segments(&self) -> Result<Vec<SegmentWithCount>, StoreError> {
        SegmentRepo::new(&self.pool).list().await
    }

    async fn delete_segment(&self, name: &SegmentName) -> Result<(), StoreError> {
        SegmentRepo::new(&self.pool).delete(name).await
    }

    async fn segment_users(&self, name: &SegmentName) -> Result<Vec<User>, StoreError> {
        SegmentRepo::new(&self.pool).users(name).await
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn user_segments(&self, user_id: i64) -> Result<BTreeSet<String>, StoreError> {
        MembershipRepo::new(&self.pool).user_segments(user_id).await
    }

    async fn apply_membership_change(
        &self,
        user_id: i64,
        plan: &MembershipPlan,
    ) -> Result<(), StoreError> {
        MembershipRepo::new(&self.pool).apply(user_id, plan).await
    }

    async fn update_user_segments(
        &self,
        user_id: i64,
        request: &MembershipRequest,
    ) -> Result<MembershipPlan, StoreError> {
        MembershipRepo::new(&self.pool).reconcile(user_id, request).await
    }

    async fn add_membership(&self, segment: &SegmentName, user_id: i64) -> Result<(), StoreError> {
        MembershipRepo::new(&self.pool).add(segment, user_id).await
    }

    async fn remove_membership(
        &self,
        segment: &SegmentName,
        user_id: i64,
    ) -> Result<(), StoreError> {
        MembershipRepo::new(&self.pool).remove(segment, user_id).await
    }
}
