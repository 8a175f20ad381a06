// Rarity score formula.
//
// Each trait contributes the inverse of (how many members share it) x
// (how many distinct values its category has):
//
//   score = sum over (category, value) of 1 / (freq(category, value) * distinct(category))
//
// A one-of-one value in a category with few options is worth the most.
// Higher score = rarer member.

use tracing::warn;

use crate::models::Member;
use crate::stats::tables::FrequencyTables;

/// A member's score plus the number of its traits that could not be found
/// in the tables.
///
/// `missing_pairs` should always be zero when the tables were built from a
/// completed fetch pass that included this member. Anything else means
/// scoring ran against the wrong or an unfinished table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RarityScore {
    pub score: f64,
    pub missing_pairs: u32,
}

/// Score one member against the frozen collection tables.
///
/// Pairs missing from either table contribute nothing and are logged.
pub fn compute_rarity(member: &Member, tables: &FrequencyTables) -> RarityScore {
    let mut score = 0.0;
    let mut missing_pairs = 0;

    for (category, value) in member.pairs() {
        let Some(frequency) = tables.frequency(category, value) else {
            warn!(id = member.id, category, value, "Trait value missing from frequency table");
            missing_pairs += 1;
            continue;
        };
        let Some(distinct) = tables.distinct_values(category) else {
            warn!(id = member.id, category, "Trait category missing from distinct-count table");
            missing_pairs += 1;
            continue;
        };
        score += 1.0 / (frequency as f64 * distinct as f64);
    }

    RarityScore {
        score,
        missing_pairs,
    }
}
