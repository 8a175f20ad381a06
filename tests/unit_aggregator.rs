// Unit tests for the concurrent aggregator.
//
// The concurrent tables must equal a sequential reference built from the
// same members, whatever order or thread the members arrive on.

use std::sync::Arc;

use rarity::models::{Member, Traits};
use rarity::stats::aggregator::Aggregator;
use rarity::stats::tables::FrequencyTables;

/// Deterministic synthetic collection: a few categories with skewed value
/// distributions, and every 11th member missing the "hat" category.
fn synthetic_members(n: u32) -> Vec<Member> {
    (1..=n)
        .map(|id| {
            let mut traits = Traits::new();
            traits.insert("background".into(), format!("bg-{}", id % 7));
            traits.insert("eyes".into(), format!("eyes-{}", (id * id) % 13));
            traits.insert("mouth".into(), format!("mouth-{}", id % 3));
            if id % 11 != 0 {
                traits.insert("hat".into(), format!("hat-{}", (id / 5) % 17));
            }
            if id == 42 {
                traits.insert("special".into(), "one-of-one".into());
            }
            Member::new(id, traits)
        })
        .collect()
}

fn expected_count(members: &[Member], category: &str, value: &str) -> u64 {
    members
        .iter()
        .filter(|m| m.traits.get(category).map(String::as_str) == Some(value))
        .count() as u64
}

fn expected_distinct(members: &[Member], category: &str) -> u64 {
    let values: std::collections::HashSet<_> = members
        .iter()
        .filter_map(|m| m.traits.get(category))
        .collect();
    values.len() as u64
}

// ============================================================
// Sequential reference
// ============================================================

#[test]
fn reference_counts_match_brute_force() {
    let members = synthetic_members(500);
    let tables = FrequencyTables::from_members(&members);

    for (category, value, count) in tables.frequency_rows() {
        assert_eq!(count, expected_count(&members, category, value));
    }
    for category in ["background", "eyes", "mouth", "hat", "special"] {
        assert_eq!(
            tables.distinct_values(category),
            Some(expected_distinct(&members, category)),
            "distinct count for {category}"
        );
    }
}

#[test]
fn reference_is_independent_of_member_order() {
    let members = synthetic_members(300);
    let mut reversed = members.clone();
    reversed.reverse();
    assert_eq!(
        FrequencyTables::from_members(&members),
        FrequencyTables::from_members(&reversed)
    );
}

// ============================================================
// Concurrent observe vs reference
// ============================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_tasks_match_sequential_reference() {
    let members = synthetic_members(2000);
    let aggregator = Arc::new(Aggregator::new());

    let mut handles = Vec::new();
    for chunk in members.chunks(37) {
        let chunk = chunk.to_vec();
        let aggregator = Arc::clone(&aggregator);
        handles.push(tokio::spawn(async move {
            for m in chunk.iter().rev() {
                aggregator.observe(m);
                tokio::task::yield_now().await;
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let tables = Arc::try_unwrap(aggregator).unwrap().finish();
    assert_eq!(tables, FrequencyTables::from_members(&members));
    assert_eq!(tables.members_observed(), 2000);
}

#[test]
fn os_threads_racing_on_first_occurrence_never_double_count() {
    // Every thread introduces the same brand-new values at once.
    for _round in 0..20 {
        let aggregator = Arc::new(Aggregator::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (1..=8u32)
            .map(|id| {
                let aggregator = Arc::clone(&aggregator);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let mut traits = Traits::new();
                    traits.insert("bg".into(), "gold".into());
                    traits.insert("eyes".into(), format!("eyes-{}", id % 2));
                    barrier.wait();
                    aggregator.observe(&Member::new(id, traits));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let tables = Arc::try_unwrap(aggregator).unwrap().finish();
        assert_eq!(tables.frequency("bg", "gold"), Some(8));
        assert_eq!(tables.distinct_values("bg"), Some(1));
        assert_eq!(tables.distinct_values("eyes"), Some(2));
    }
}

#[test]
fn empty_aggregator_finishes_empty() {
    let tables = Aggregator::new().finish();
    assert!(tables.is_empty());
    assert_eq!(tables.category_count(), 0);
    assert!(tables.frequency_rows().is_empty());
}
