//! Segment membership reconciliation
//!
//! Turns a requested add list and remove list into the minimal set of
//! changes against a user's current membership:
//!
//! ```text
//! I              = A ∩ R
//! effective_add  = (A \ C) \ I
//! effective_rem  = (R ∩ C) \ I
//! ```
//!
//! Names requested both ways cancel out. Everything here is pure; the store
//! decides where `C` comes from and how the plan is written.

use std::collections::BTreeSet;

/// Requested membership change, with list duplicates collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipRequest {
    pub add: BTreeSet<String>,
    pub remove: BTreeSet<String>,
}

impl MembershipRequest {
    /// Build a request from raw lists in any order.
    ///
    /// # Example
    /// ```
    /// use segmentctl_core::MembershipRequest;
    ///
    /// let req = MembershipRequest::from_lists(["x", "x"], Vec::<String>::new());
    /// assert_eq!(req.add.len(), 1);
    /// ```
    pub fn from_lists<A, R, S, T>(add: A, remove: R) -> Self
    where
        A: IntoIterator<Item = S>,
        R: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            add: add.into_iter().map(Into::into).collect(),
            remove: remove.into_iter().map(Into::into).collect(),
        }
    }

    /// Names requested both to add and to remove.
    pub fn cancelled(&self) -> BTreeSet<String> {
        self.add.intersection(&self.remove).cloned().collect()
    }

    /// Every segment name the request mentions, cancelled ones included.
    pub fn referenced(&self) -> BTreeSet<String> {
        self.add.union(&self.remove).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Net changes to write for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl MembershipPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Membership after the plan is written on top of `current`.
    pub fn apply(&self, current: &BTreeSet<String>) -> BTreeSet<String> {
        current
            .difference(&self.to_remove)
            .chain(self.to_add.iter())
            .cloned()
            .collect()
    }
}

/// Compute the plan for `request` against the `current` membership.
pub fn reconcile(current: &BTreeSet<String>, request: &MembershipRequest) -> MembershipPlan {
    let cancelled = request.cancelled();

    let to_add = request
        .add
        .iter()
        .filter(|name| !current.contains(*name) && !cancelled.contains(*name))
        .cloned()
        .collect();

    let to_remove = request
        .remove
        .iter()
        .filter(|name| current.contains(*name) && !cancelled.contains(*name))
        .cloned()
        .collect();

    MembershipPlan { to_add, to_remove }
}
