use std::collections::BTreeSet;

use proptest::prelude::*;
use segmentctl_core::{reconcile, MembershipRequest};

// Small alphabet so that adds, removes and current membership overlap often
fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-f]", 0..8)
}

fn arb_current() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-f]", 0..6)
}

proptest! {
    /// Property: applying the same request twice equals applying it once
    #[test]
    fn prop_reconcile_is_idempotent(current in arb_current(), add in arb_names(), remove in arb_names()) {
        let req = MembershipRequest::from_lists(add, remove);

        let once = reconcile(&current, &req).apply(&current);
        let twice = reconcile(&once, &req).apply(&once);

        prop_assert_eq!(&once, &twice);
        prop_assert!(reconcile(&once, &req).is_empty());
    }

    /// Property: names requested both ways keep their current state
    #[test]
    fn prop_cancelled_names_untouched(current in arb_current(), add in arb_names(), remove in arb_names()) {
        let req = MembershipRequest::from_lists(add, remove);
        let after = reconcile(&current, &req).apply(&current);

        for name in req.cancelled() {
            prop_assert_eq!(current.contains(&name), after.contains(&name));
        }
    }

    /// Property: the plan only adds non-members and only removes members
    #[test]
    fn prop_plan_is_minimal(current in arb_current(), add in arb_names(), remove in arb_names()) {
        let plan = reconcile(&current, &MembershipRequest::from_lists(add, remove));

        prop_assert!(plan.to_add.is_disjoint(&current));
        prop_assert!(plan.to_remove.is_subset(&current));
        prop_assert!(plan.to_add.is_disjoint(&plan.to_remove));
    }

    /// Property: input order and duplicates do not change the plan
    #[test]
    fn prop_order_independent(current in arb_current(), add in arb_names(), remove in arb_names()) {
        let forward = reconcile(&current, &MembershipRequest::from_lists(add.clone(), remove.clone()));

        let mut add_rev = add.clone();
        add_rev.reverse();
        add_rev.extend(add);
        let mut remove_rev = remove;
        remove_rev.reverse();

        let shuffled = reconcile(&current, &MembershipRequest::from_lists(add_rev, remove_rev));
        prop_assert_eq!(forward, shuffled);
    }

    /// Property: the result holds every non-cancelled add and no non-cancelled remove
    #[test]
    fn prop_result_reflects_intent(current in arb_current(), add in arb_names(), remove in arb_names()) {
        let req = MembershipRequest::from_lists(add, remove);
        let cancelled = req.cancelled();
        let after = reconcile(&current, &req).apply(&current);

        for name in req.add.difference(&cancelled) {
            prop_assert!(after.contains(name));
        }
        for name in req.remove.difference(&cancelled) {
            prop_assert!(!after.contains(name));
        }
    }
}

#[test]
fn scenario_overlap_with_existing() {
    let current: BTreeSet<String> = ["red", "blue"].iter().map(|s| s.to_string()).collect();
    let req = MembershipRequest::from_lists(["blue", "green"], ["red", "green"]);

    let plan = reconcile(&current, &req);
    let after = plan.apply(&current);

    assert!(plan.to_add.is_empty());
    assert_eq!(plan.to_remove.into_iter().collect::<Vec<_>>(), vec!["red"]);
    assert_eq!(after.into_iter().collect::<Vec<_>>(), vec!["blue"]);
}
