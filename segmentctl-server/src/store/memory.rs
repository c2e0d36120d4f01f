//! In-memory store
//!
//! Every operation runs under one mutex, so each call is atomic and
//! isolated the way a transaction is in [`crate::db::PgStore`].

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use segmentctl_core::{reconcile, MembershipPlan, MembershipRequest, SegmentName, UserFields};

use super::{
    first_missing, MembershipStore, Segment, SegmentStore, SegmentWithCount, StoreError, User,
    UserStore, UserWithSegments,
};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    last_user_id: i64,
    users: BTreeMap<i64, User>,
    segments: BTreeMap<String, Segment>,
    /// user id -> segment names
    memberships: BTreeMap<i64, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn ensure_user(&self, id: i64) -> Result<&User, StoreError> {
        self.users.get(&id).ok_or(StoreError::UserNotFound(id))
    }

    fn ensure_segments(&self, names: &BTreeSet<String>) -> Result<(), StoreError> {
        let existing: BTreeSet<String> = names
            .iter()
            .filter(|name| self.segments.contains_key(*name))
            .cloned()
            .collect();
        match first_missing(names, &existing) {
            Some(name) => Err(StoreError::SegmentNotFound(name.clone())),
            None => Ok(()),
        }
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn with_segments(&self, user: &User) -> UserWithSegments {
        UserWithSegments {
            id: user.id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
            segments: self
                .memberships
                .get(&user.id)
                .map(|names| names.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }

    fn member_count(&self, segment: &str) -> i64 {
        self.memberships
            .values()
            .filter(|names| names.contains(segment))
            .count() as i64
    }

    fn write_plan(&mut self, user_id: i64, plan: &MembershipPlan) {
        let names = self.memberships.entry(user_id).or_default();
        for name in &plan.to_remove {
            names.remove(name);
        }
        names.extend(plan.to_add.iter().cloned());
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, fields: UserFields) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state.username_taken(&fields.username, None) {
            return Err(StoreError::AlreadyExists {
                resource: "user",
                id: fields.username,
            });
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            firstname: fields.firstname,
            lastname: fields.lastname,
            username: fields.username,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<UserWithSegments, StoreError> {
        let state = self.state.lock().await;
        let user = state.ensure_user(id)?;
        Ok(state.with_segments(user))
    }

    async fn list_users(&self) -> Result<Vec<UserWithSegments>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.values().map(|u| state.with_segments(u)).collect())
    }

    async fn update_user(&self, id: i64, fields: UserFields) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_user(id)?;
        if state.username_taken(&fields.username, Some(id)) {
            return Err(StoreError::AlreadyExists {
                resource: "user",
                id: fields.username,
            });
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound(id))?;
        user.firstname = fields.firstname;
        user.lastname = fields.lastname;
        user.username = fields.username;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.users.remove(&id).ok_or(StoreError::UserNotFound(id))?;
        state.memberships.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SegmentStore for MemoryStore {
    async fn create_segment(&self, name: SegmentName) -> Result<Segment, StoreError> {
        let mut state = self.state.lock().await;
        if state.segments.contains_key(name.as_str()) {
            return Err(StoreError::AlreadyExists {
                resource: "segment",
                id: name.into_string(),
            });
        }

        let segment = Segment {
            name: name.into_string(),
            created_at: Utc::now(),
        };
        state.segments.insert(segment.name.clone(), segment.clone());
        Ok(segment)
    }

    async fn get_segment(&self, name: &SegmentName) -> Result<SegmentWithCount, StoreError> {
        let state = self.state.lock().await;
        let segment = state
            .segments
            .get(name.as_str())
            .ok_or_else(|| StoreError::SegmentNotFound(name.to_string()))?;
        Ok(SegmentWithCount {
            name: segment.name.clone(),
            created_at: segment.created_at,
            member_count: state.member_count(&segment.name),
        })
    }

    async fn list_segments(&self) -> Result<Vec<SegmentWithCount>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .segments
            .values()
            .map(|s| SegmentWithCount {
                name: s.name.clone(),
                created_at: s.created_at,
                member_count: state.member_count(&s.name),
            })
            .collect())
    }

    async fn delete_segment(&self, name: &SegmentName) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .segments
            .remove(name.as_str())
            .ok_or_else(|| StoreError::SegmentNotFound(name.to_string()))?;
        for names in state.memberships.values_mut() {
            names.remove(name.as_str());
        }
        Ok(())
    }

    async fn segment_users(&self, name: &SegmentName) -> Result<Vec<User>, StoreError> {
        let state = self.state.lock().await;
        if !state.segments.contains_key(name.as_str()) {
            return Err(StoreError::SegmentNotFound(name.to_string()));
        }
        Ok(state
            .memberships
            .iter()
            .filter(|(_, names)| names.contains(name.as_str()))
            .filter_map(|(id, _)| state.users.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn user_segments(&self, user_id: i64) -> Result<BTreeSet<String>, StoreError> {
        let state = self.state.lock().await;
        state.ensure_user(user_id)?;
        Ok(state.memberships.get(&user_id).cloned().unwrap_or_default())
    }

    async fn apply_membership_change(
        &self,
        user_id: i64,
        plan: &MembershipPlan,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_user(user_id)?;
        let referenced: BTreeSet<String> = plan.to_add.union(&plan.to_remove).cloned().collect();
        state.ensure_segments(&referenced)?;
        state.write_plan(user_id, plan);
        Ok(())
    }

    async fn update_user_segments(
        &self,
        user_id: i64,
        request: &MembershipRequest,
    ) -> Result<MembershipPlan, StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_user(user_id)?;
        state.ensure_segments(&request.referenced())?;

        let current = state.memberships.get(&user_id).cloned().unwrap_or_default();
        let plan = reconcile(&current, request);
        state.write_plan(user_id, &plan);
        Ok(plan)
    }

    async fn add_membership(&self, segment: &SegmentName, user_id: i64) -> Result<(), StoreError> {
        let plan = MembershipPlan {
            to_add: BTreeSet::from([segment.to_string()]),
            ..Default::default()
        };
        self.apply_membership_change(user_id, &plan).await
    }

    async fn remove_membership(
        &self,
        segment: &SegmentName,
        user_id: i64,
    ) -> Result<(), StoreError> {
        let plan = MembershipPlan {
            to_remove: BTreeSet::from([segment.to_string()]),
            ..Default::default()
        };
        self.apply_membership_change(user_id, &plan).await
    }
}
