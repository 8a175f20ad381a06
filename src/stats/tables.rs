// Frequency tables over the whole collection.
//
// Two tables are kept side by side:
//
//   frequency[(category, value)] = members carrying that value
//   distinct[category]           = distinct values seen for that category
//
// `distinct` is bumped exactly when a (category, value) count goes 0 -> 1,
// so the two tables always agree with each other. The tables are frozen
// (only `&` access) once the fetch pass is over, and scoring reads them.

use std::collections::HashMap;

use crate::models::Member;

/// Occurrence counts for every (category, value) pair plus distinct-value
/// counts per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTables {
    /// category -> value -> count. Nested so lookups can borrow `&str` keys.
    frequency: HashMap<String, HashMap<String, u64>>,
    distinct: HashMap<String, u64>,
    members_observed: u64,
}

impl FrequencyTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build tables sequentially from a set of members.
    ///
    /// This is the single-threaded reference the concurrent aggregator must match.
    pub fn from_members<'a>(members: impl IntoIterator<Item = &'a Member>) -> Self {
        let mut tables = Self::new();
        for member in members {
            tables.record(member);
        }
        tables
    }

    /// Fold one member's attributes into the tables.
    pub(crate) fn record(&mut self, member: &Member) {
        for (category, value) in member.pairs() {
            let values = self.frequency.entry(category.to_string()).or_default();
            let count = values.entry(value.to_string()).or_insert(0);
            *count += 1;
            if *count == 1 {
                *self.distinct.entry(category.to_string()).or_insert(0) += 1;
            }
        }
        self.members_observed += 1;
    }

    /// How many members carry `value` for `category`.
    pub fn frequency(&self, category: &str, value: &str) -> Option<u64> {
        self.frequency.get(category)?.get(value).copied()
    }

    /// How many distinct values have been seen for `category`.
    pub fn distinct_values(&self, category: &str) -> Option<u64> {
        self.distinct.get(category).copied()
    }

    /// Number of members folded into the tables.
    pub fn members_observed(&self) -> u64 {
        self.members_observed
    }

    /// Number of categories seen across the collection.
    pub fn category_count(&self) -> usize {
        self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members_observed == 0
    }

    /// All (category, value, count) rows, sorted by category then value.
    pub fn frequency_rows(&self) -> Vec<(&str, &str, u64)> {
        let mut rows: Vec<_> = self
            .frequency
            .iter()
            .flat_map(|(category, values)| {
                values
                    .iter()
                    .map(move |(value, count)| (category.as_str(), value.as_str(), *count))
            })
            .collect();
        rows.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        rows
    }

    /// All (category, distinct count) rows, sorted by category.
    pub fn distinct_rows(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<_> = self
            .distinct
            .iter()
            .map(|(category, count)| (category.as_str(), *count))
            .collect();
        rows.sort_unstable_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Traits;

    fn member(id: u32, pairs: &[(&str, &str)]) -> Member {
        let traits: Traits = pairs
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_string()))
            .collect();
        Member::new(id, traits)
    }

    #[test]
    fn test_record_counts_and_first_occurrence() {
        let mut tables = FrequencyTables::new();
        tables.record(&member(1, &[("bg", "red"), ("hat", "cap")]));
        tables.record(&member(2, &[("bg", "red")]));
        tables.record(&member(3, &[("bg", "blue")]));

        assert_eq!(tables.frequency("bg", "red"), Some(2));
        assert_eq!(tables.frequency("bg", "blue"), Some(1));
        assert_eq!(tables.frequency("hat", "cap"), Some(1));
        assert_eq!(tables.distinct_values("bg"), Some(2));
        assert_eq!(tables.distinct_values("hat"), Some(1));
        assert_eq!(tables.members_observed(), 3);
    }

    #[test]
    fn test_missing_keys_are_none() {
        let tables = FrequencyTables::from_members(&[member(1, &[("bg", "red")])]);
        assert_eq!(tables.frequency("bg", "green"), None);
        assert_eq!(tables.frequency("eyes", "red"), None);
        assert_eq!(tables.distinct_values("eyes"), None);
    }

    #[test]
    fn test_member_without_traits_still_counts_as_observed() {
        let tables = FrequencyTables::from_members(&[member(1, &[])]);
        assert_eq!(tables.members_observed(), 1);
        assert_eq!(tables.category_count(), 0);
        assert!(!tables.is_empty());
    }

    #[test]
    fn test_rows_are_sorted() {
        let tables = FrequencyTables::from_members(&[
            member(1, &[("mouth", "grin"), ("bg", "red")]),
            member(2, &[("bg", "blue")]),
        ]);
        assert_eq!(
            tables.frequency_rows(),
            vec![("bg", "blue", 1), ("bg", "red", 1), ("mouth", "grin", 1)]
        );
        assert_eq!(tables.distinct_rows(), vec![("bg", 2), ("mouth", 1)]);
    }
}
