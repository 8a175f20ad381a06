// Rank pipeline: fetch everything -> barrier -> score -> top-K.
//
// Scoring takes `&FrequencyTables` from a finished `Harvest`, and a Harvest
// only exists once `fetch_collection` has joined every task. So there is no
// way to score against a table that is still being written.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::fetch::{self, FetchOptions, Harvest};
use crate::metadata::traits::MetadataSource;
use crate::models::{Collection, Member, MemberId, RankedMember};
use crate::ranking::top_k::TopK;
use crate::scoring::rarity::compute_rarity;

/// Default number of members reported.
pub const DEFAULT_TOP_K: usize = 5;

/// Scores for every fetched member, in id order.
#[derive(Debug, Clone, Default)]
pub struct ScoreSheet {
    pub scores: Vec<RankedMember>,
    /// Trait pairs that had no table entry across all members.
    pub missing_pairs: u64,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct Ranking {
    pub collection: Collection,
    /// Top-K members, best first.
    pub top: Vec<RankedMember>,
    pub sheet: ScoreSheet,
    pub harvest: Harvest,
}

impl Ranking {
    pub fn requested(&self) -> u32 {
        self.collection.size
    }

    pub fn fetched(&self) -> usize {
        self.harvest.fetched_count()
    }

    pub fn failed_ids(&self) -> Vec<MemberId> {
        self.harvest.failed_ids()
    }

    /// Every fetched member paired with its score from the sheet, in id order.
    pub fn scored_members(&self) -> impl Iterator<Item = (&Member, f64)> {
        // The sheet was built from `harvest.fetched()`, so the two line up.
        self.harvest
            .fetched()
            .zip(&self.sheet.scores)
            .map(|(member, ranked)| (member, ranked.score))
    }
}

/// Score every fetched member against the harvest's frozen tables.
pub fn score_harvest(harvest: &Harvest) -> ScoreSheet {
    let mut sheet = ScoreSheet {
        scores: Vec::with_capacity(harvest.fetched_count()),
        missing_pairs: 0,
    };
    for member in harvest.fetched() {
        let rarity = compute_rarity(member, &harvest.tables);
        sheet.missing_pairs += u64::from(rarity.missing_pairs);
        sheet.scores.push(RankedMember {
            id: member.id,
            score: rarity.score,
        });
    }
    sheet
}

/// Fold scores through a bounded min-heap and return the best `k`, best first.
pub fn select_top_k(scores: impl IntoIterator<Item = RankedMember>, k: usize) -> Vec<RankedMember> {
    let mut top = TopK::new(k);
    top.extend(scores);
    top.into_sorted_desc()
}

/// Run the full pipeline over `collection`.
///
/// Individual fetch failures only shrink the ranked pool. Errors come from
/// invalid options alone.
pub async fn run(
    source: Arc<dyn MetadataSource>,
    collection: &Collection,
    top_k: usize,
    options: &FetchOptions,
) -> Result<Ranking> {
    let harvest = fetch::fetch_collection(source, collection, options).await?;

    // Barrier passed: the tables are frozen from here on.
    let sheet = score_harvest(&harvest);
    if sheet.missing_pairs > 0 {
        warn!(
            missing_pairs = sheet.missing_pairs,
            "Scored against incomplete tables; some traits contributed nothing"
        );
    }

    let top = select_top_k(sheet.scores.iter().copied(), top_k);

    info!(
        scored = sheet.scores.len(),
        top_k,
        returned = top.len(),
        "Ranking complete"
    );

    Ok(Ranking {
        collection: collection.clone(),
        top,
        sheet,
        harvest,
    })
}
