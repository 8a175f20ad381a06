// Data models — the types that flow through the ranking pipeline.
//
// These are kept separate from the fetcher and the aggregator so every
// module can share them without depending on reqwest or the stats tables.

use std::collections::BTreeMap;

/// Member ids are dense and 1-based: a collection of size N holds ids 1..=N.
pub type MemberId = u32;

/// Attribute map as served by the metadata provider: category -> value.
///
/// A BTreeMap keeps iteration order stable, so a member's score is summed
/// in the same order on every run.
pub type Traits = BTreeMap<String, String>;

/// A single member of the collection with its fetched attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub traits: Traits,
}

impl Member {
    pub fn new(id: MemberId, traits: Traits) -> Self {
        Self { id, traits }
    }

    /// Iterate over the member's (category, value) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.traits.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

/// A collection on the metadata provider: its URL slug and how many members it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub slug: String,
    pub size: u32,
}

impl Collection {
    pub fn new(slug: impl Into<String>, size: u32) -> Self {
        Self {
            slug: slug.into(),
            size,
        }
    }

    /// All member ids in the collection, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = MemberId> {
        1..=self.size
    }

    /// Position of a member id in an id-indexed result vector.
    ///
    /// Returns None for ids outside 1..=size.
    pub fn slot(&self, id: MemberId) -> Option<usize> {
        if id == 0 || id > self.size {
            None
        } else {
            Some((id - 1) as usize)
        }
    }
}

/// One row of the final ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMember {
    pub id: MemberId,
    pub score: f64,
}
