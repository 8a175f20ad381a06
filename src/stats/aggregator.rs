// Concurrent aggregator — the only shared mutable state in a run.
//
// Fetch tasks call `observe` as each member arrives. Every update for one
// member happens under a single coarse lock, so the first-occurrence check
// and the distinct-count bump can never interleave with another task.
// Lock hold time is a handful of hash map updates, negligible next to a
// network round-trip.

use std::sync::{Mutex, MutexGuard};

use super::tables::FrequencyTables;
use crate::models::Member;

/// Thread-safe builder for [`FrequencyTables`].
///
/// Shared across fetch tasks via `Arc<Aggregator>`. Once every task has
/// finished, [`Aggregator::finish`] hands back the frozen tables; scoring
/// only accepts `&FrequencyTables`, so it cannot run against a table that
/// is still being written.
#[derive(Debug, Default)]
pub struct Aggregator {
    tables: Mutex<FrequencyTables>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fetched member into the frequency tables.
    ///
    /// Linearizable: concurrent calls behave as if applied one at a time.
    pub fn observe(&self, member: &Member) {
        self.lock().record(member);
    }

    /// Number of members observed so far.
    pub fn members_observed(&self) -> u64 {
        self.lock().members_observed()
    }

    /// Copy of the current tables without ending aggregation.
    pub fn snapshot(&self) -> FrequencyTables {
        self.lock().clone()
    }

    /// End aggregation and return the frozen tables.
    pub fn finish(self) -> FrequencyTables {
        self.tables
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // A panicking task cannot leave a half-applied member behind (record
    // only touches counters), so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, FrequencyTables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
