// Bounded top-K selection over a stream of scores.
//
// Keeps the K best (id, score) pairs seen so far in a min-heap whose root
// is the weakest kept entry. A new score only gets in by strictly beating
// that root, so the whole pass is O(N log K) and memory stays at K entries
// no matter how large the collection is.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::models::{MemberId, RankedMember};

/// Heap entry. Orders by score, then by id with lower ids ranking higher,
/// so equal scores always come out in the same order.
#[derive(Debug, Clone, Copy)]
struct Entry {
    score: f64,
    id: MemberId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl From<Entry> for RankedMember {
    fn from(e: Entry) -> Self {
        RankedMember {
            id: e.id,
            score: e.score,
        }
    }
}

/// Bounded min-priority queue holding the K highest-scoring members.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry>>,
}

impl TopK {
    /// Create a selector that keeps at most `k` entries. `k = 0` keeps nothing.
    pub fn new(k: usize) -> Self {
        Self {
            capacity: k,
            // k may be "everything" (usize::MAX); grow lazily past this
            heap: BinaryHeap::with_capacity(k.min(4096)),
        }
    }

    /// Offer a score. Returns true if it was kept.
    ///
    /// While the heap has room every score is kept. Once full, the score
    /// must be strictly greater than the current minimum to displace it;
    /// a tie leaves the heap unchanged.
    pub fn push(&mut self, id: MemberId, score: f64) -> bool {
        if self.capacity == 0 {
            return false;
        }

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(Entry { score, id }));
            return true;
        }

        let beats_min = self
            .heap
            .peek()
            .is_some_and(|Reverse(min)| score > min.score);
        if !beats_min {
            return false;
        }

        self.heap.pop();
        self.heap.push(Reverse(Entry { score, id }));
        true
    }

    /// The weakest kept entry (the one the next push would have to beat).
    pub fn peek_min(&self) -> Option<RankedMember> {
        self.heap.peek().map(|Reverse(e)| (*e).into())
    }

    /// Remove and return the weakest kept entry.
    pub fn pop_min(&mut self) -> Option<RankedMember> {
        self.heap.pop().map(|Reverse(e)| e.into())
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Drain into a list ordered best-first (descending score, ties by ascending id).
    pub fn into_sorted_desc(mut self) -> Vec<RankedMember> {
        let mut ranked = Vec::with_capacity(self.heap.len());
        while let Some(entry) = self.pop_min() {
            ranked.push(entry);
        }
        ranked.reverse();
        ranked
    }
}

impl Extend<RankedMember> for TopK {
    fn extend<I: IntoIterator<Item = RankedMember>>(&mut self, iter: I) {
        for m in iter {
            self.push(m.id, m.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_highest_scores() {
        let mut top = TopK::new(2);
        for (id, score) in [(1, 0.1), (2, 0.9), (3, 0.5), (4, 0.3)] {
            top.push(id, score);
        }
        let ids: Vec<_> = top.into_sorted_desc().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut top = TopK::new(0);
        assert!(!top.push(1, 10.0));
        assert!(top.is_empty());
        assert!(top.into_sorted_desc().is_empty());
    }

    #[test]
    fn test_tie_with_minimum_does_not_displace() {
        let mut top = TopK::new(1);
        assert!(top.push(1, 0.5));
        assert!(!top.push(2, 0.5));
        assert_eq!(top.peek_min().map(|m| m.id), Some(1));
    }

    #[test]
    fn test_pop_min_yields_ascending_scores() {
        let mut top = TopK::new(3);
        for (id, score) in [(1, 3.0), (2, 1.0), (3, 2.0)] {
            top.push(id, score);
        }
        assert_eq!(top.pop_min().map(|m| m.id), Some(2));
        assert_eq!(top.pop_min().map(|m| m.id), Some(3));
        assert_eq!(top.pop_min().map(|m| m.id), Some(1));
        assert_eq!(top.pop_min(), None);
    }
}
