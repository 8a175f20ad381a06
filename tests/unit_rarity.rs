// Unit tests for the rarity formula over frozen tables.

use rarity::models::{Member, Traits};
use rarity::pipeline::rank::select_top_k;
use rarity::scoring::rarity::compute_rarity;
use rarity::stats::tables::FrequencyTables;

fn member(id: u32, pairs: &[(&str, &str)]) -> Member {
    let traits: Traits = pairs
        .iter()
        .map(|(c, v)| (c.to_string(), v.to_string()))
        .collect();
    Member::new(id, traits)
}

fn red_blue_collection() -> Vec<Member> {
    vec![
        member(1, &[("bg", "red")]),
        member(2, &[("bg", "red")]),
        member(3, &[("bg", "blue")]),
        member(4, &[("bg", "red")]),
    ]
}

// ============================================================
// Worked example: three red, one blue
// ============================================================

#[test]
fn red_blue_tables() {
    let tables = FrequencyTables::from_members(&red_blue_collection());
    assert_eq!(tables.frequency("bg", "red"), Some(3));
    assert_eq!(tables.frequency("bg", "blue"), Some(1));
    assert_eq!(tables.distinct_values("bg"), Some(2));
}

#[test]
fn red_blue_scores() {
    let members = red_blue_collection();
    let tables = FrequencyTables::from_members(&members);

    let blue = compute_rarity(&members[2], &tables).score;
    assert!((blue - 0.5).abs() < 1e-12, "Expected 0.5, got {blue}");

    for red in [&members[0], &members[1], &members[3]] {
        let s = compute_rarity(red, &tables).score;
        assert!((s - 0.1667).abs() < 1e-4, "Expected ~0.1667, got {s}");
    }
}

#[test]
fn red_blue_top_one_is_blue() {
    let members = red_blue_collection();
    let tables = FrequencyTables::from_members(&members);
    let scores = members.iter().map(|m| rarity::models::RankedMember {
        id: m.id,
        score: compute_rarity(m, &tables).score,
    });
    let top = select_top_k(scores, 1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, 3);
}

// ============================================================
// Determinism
// ============================================================

#[test]
fn score_ignores_arrival_order_of_other_members() {
    let members = vec![
        member(1, &[("bg", "red"), ("eyes", "laser"), ("hat", "crown")]),
        member(2, &[("bg", "red"), ("eyes", "sleepy")]),
        member(3, &[("bg", "teal"), ("eyes", "sleepy"), ("hat", "cap")]),
        member(4, &[("bg", "red"), ("eyes", "sleepy"), ("hat", "cap")]),
    ];
    let forward = FrequencyTables::from_members(&members);
    let backward = FrequencyTables::from_members(members.iter().rev());

    for m in &members {
        let a = compute_rarity(m, &forward).score;
        let b = compute_rarity(m, &backward).score;
        assert_eq!(a.to_bits(), b.to_bits(), "member {} differs", m.id);
    }
}

#[test]
fn rarer_traits_score_higher() {
    let members = vec![
        member(1, &[("bg", "red"), ("hat", "crown")]),
        member(2, &[("bg", "red"), ("hat", "cap")]),
        member(3, &[("bg", "red"), ("hat", "cap")]),
    ];
    let tables = FrequencyTables::from_members(&members);
    let crown = compute_rarity(&members[0], &tables).score;
    let cap = compute_rarity(&members[1], &tables).score;
    assert!(crown > cap, "crown {crown} should beat cap {cap}");
}

// ============================================================
// Inconsistency signal
// ============================================================

#[test]
fn member_absent_from_tables_contributes_nothing_and_is_flagged() {
    let members = red_blue_collection();
    let tables = FrequencyTables::from_members(&members);

    let stranger = member(99, &[("bg", "green"), ("eyes", "laser")]);
    let s = compute_rarity(&stranger, &tables);
    assert_eq!(s.score, 0.0);
    assert_eq!(s.missing_pairs, 2);
}

#[test]
fn complete_tables_raise_no_inconsistency() {
    let members = red_blue_collection();
    let tables = FrequencyTables::from_members(&members);
    for m in &members {
        assert_eq!(compute_rarity(m, &tables).missing_pairs, 0);
    }
}
