//! Multi-replica scenarios
//!
//! Each set stands in for a different node. All nodes read one shared logical
//! clock so "later" in the test body means a larger timestamp.

use lwwset_core::{Bias, Clock, FixedClock, LWWElementSet, LogicalClock, Replica};
use std::collections::BTreeSet;
use std::sync::Arc;

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn replicas(n: usize) -> Vec<Replica<Arc<LogicalClock>>> {
    let clock = Arc::new(LogicalClock::new());
    (0..n)
        .map(|i| Replica::new(format!("node_{}", i), Arc::clone(&clock)))
        .collect()
}

#[test]
fn add_twice_has_no_extra_effect() {
    let clock = LogicalClock::new();
    let mut s1 = LWWElementSet::new();
    s1.add("Groot", &clock);
    assert_eq!(s1.materialize(), set_of(&["Groot"]));

    s1.add("Groot", &clock);
    assert_eq!(s1.materialize(), set_of(&["Groot"]));
    assert_eq!(s1.add_log().len(), 1);
}

#[test]
fn remove_on_empty_has_no_effect() {
    let clock = LogicalClock::new();
    let mut s1 = LWWElementSet::new();
    s1.add("Rocket", &clock);
    s1.remove("Rocket", &clock);
    assert!(s1.materialize().is_empty());

    s1.remove("Rocket", &clock);
    assert!(s1.materialize().is_empty());
}

#[test]
fn final_set_after_mixed_operations() {
    let clock = LogicalClock::new();
    let mut s1 = LWWElementSet::new();
    s1.add("Starlord", &clock);
    s1.add("Gamora", &clock);
    s1.add("Drax", &clock);
    s1.remove("Gamora", &clock);
    s1.add("Rocket", &clock);

    assert_eq!(s1.materialize(), set_of(&["Starlord", "Drax", "Rocket"]));
}

#[test]
fn merge_commutative() {
    let mut nodes = replicas(2);
    nodes[0].add("Groot");
    nodes[1].add("Rocket");

    let mut s1_merge = nodes[0].state().clone();
    s1_merge.merge(nodes[1].state());
    let mut s2_merge = nodes[1].state().clone();
    s2_merge.merge(nodes[0].state());

    assert_eq!(s1_merge, s2_merge);
    assert_eq!(s1_merge.materialize(), set_of(&["Groot", "Rocket"]));
}

#[test]
fn merge_associative() {
    let mut nodes = replicas(3);
    nodes[0].add("Groot");
    nodes[1].add("Rocket");
    nodes[1].remove("Groot");
    nodes[2].add("Groot");
    nodes[2].remove("Rocket");

    let (a, b, c) = (nodes[0].state(), nodes[1].state(), nodes[2].state());

    let mut left = a.clone();
    left.merge(b);
    left.merge(c);

    let mut bc = b.clone();
    bc.merge(c);
    let mut right = a.clone();
    right.merge(&bc);

    assert_eq!(left.materialize(), right.materialize());
    assert_eq!(left, right);
    assert_eq!(left.materialize(), set_of(&["Groot"]));
}

#[test]
fn merge_add_basic() {
    let mut nodes = replicas(2);
    nodes[0].add("Groot");
    nodes[1].add("Rocket");

    let (s1, s2) = nodes.split_at_mut(1);
    let (s1, s2) = (&mut s1[0], &mut s2[0]);

    s1.merge_from(s2);
    assert_eq!(s1.materialize(), set_of(&["Groot", "Rocket"]));

    // Merging again changes nothing
    s1.merge_from(s2);
    assert_eq!(s1.materialize(), set_of(&["Groot", "Rocket"]));

    s2.merge_from(s1);
    assert_eq!(s1.state(), s2.state());
}

#[test]
fn merge_remove_basic() {
    let mut nodes = replicas(2);
    nodes[0].add("Groot");
    nodes[0].remove("Groot");

    let (s1, s2) = nodes.split_at_mut(1);
    s2[0].merge_from(&s1[0]);
    assert!(s2[0].materialize().is_empty());
}

#[test]
fn remove_on_other_replica_propagates() {
    let mut nodes = replicas(2);
    let (s1, s2) = nodes.split_at_mut(1);
    let (s1, s2) = (&mut s1[0], &mut s2[0]);

    s1.add("Groot");
    s2.merge_from(s1);
    s2.remove("Groot");
    s1.merge_from(s2);

    assert!(s1.materialize().is_empty());
    assert!(s2.materialize().is_empty());
}

#[test]
fn late_re_add_wins() {
    let mut nodes = replicas(2);
    let (s1, s2) = nodes.split_at_mut(1);
    let (s1, s2) = (&mut s1[0], &mut s2[0]);

    assert_eq!(s1.add("Groot"), 1);
    s2.merge_from(s1);
    assert_eq!(s2.remove("Groot"), 2);

    // s1 adds again after s2's removal
    assert_eq!(s1.add("Groot"), 3);

    s1.merge_from(s2);
    assert_eq!(s1.materialize(), set_of(&["Groot"]));

    s2.merge_from(s1);
    assert_eq!(s2.materialize(), set_of(&["Groot"]));
}

#[test]
fn unseen_concurrent_remove_wins_when_later() {
    let mut nodes = replicas(2);
    let (s1, s2) = nodes.split_at_mut(1);
    let (s1, s2) = (&mut s1[0], &mut s2[0]);

    s1.add("Groot");

    // s2 adds its own and removes it right after, without seeing s1
    s2.add("Groot");
    s2.remove("Groot");
    s1.merge_from(s2);

    assert!(s1.materialize().is_empty());
}

#[test]
fn duplicated_and_reordered_delivery_converges() {
    let mut nodes = replicas(3);
    nodes[0].add("Groot");
    nodes[1].add("Rocket");
    nodes[1].remove("Groot");
    nodes[2].add("Drax");
    nodes[0].remove("Drax");

    let states: Vec<LWWElementSet> = nodes.iter().map(|n| n.state().clone()).collect();

    let mut forward = LWWElementSet::new();
    for s in &states {
        forward.merge(s);
    }

    let mut chaotic = LWWElementSet::new();
    for idx in [2, 0, 2, 1, 1, 0, 2] {
        chaotic.merge(&states[idx]);
    }

    assert_eq!(forward, chaotic);
    assert_eq!(forward.materialize(), set_of(&["Rocket"]));
}

#[test]
fn same_timestamp_tie_follows_bias() {
    let tick = FixedClock(10);

    for (bias, expected) in [(Bias::RemoveWins, set_of(&[])), (Bias::AddWins, set_of(&["Groot"]))] {
        let mut adder = LWWElementSet::with_bias(bias);
        let mut remover = LWWElementSet::with_bias(bias);
        adder.add("Groot", &tick);
        remover.remove("Groot", &tick);

        let mut left = adder.clone();
        left.merge(&remover);
        let mut right = remover.clone();
        right.merge(&adder);

        assert_eq!(left.materialize(), expected);
        assert_eq!(right.materialize(), expected);
        assert_eq!(left, right);
    }
}

#[test]
fn strict_equality_distinguishes_history() {
    let clock = LogicalClock::new();
    let mut s1 = LWWElementSet::new();
    let mut s2 = LWWElementSet::new();

    s1.add("Groot", &clock);
    s2.add("Groot", &clock);

    assert!(s1.converges_with(&s2));
    assert_ne!(s1, s2);
    assert_eq!(s1.equals_any(&s2), Ok(false));
    assert!(s1.equals_any(&42u32).is_err());
}

#[test]
fn shared_clock_readings_are_ordered() {
    let clock = Arc::new(LogicalClock::new());
    let first = clock.now();
    let mut r = Replica::new("r", Arc::clone(&clock));
    let second = r.add("Groot");
    assert!(second > first);
}
