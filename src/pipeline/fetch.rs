// Fetch scheduler: pull every member of a collection under a concurrency bound.
//
// Two interchangeable strategies drive the same per-member step
// (fetch -> observe -> slot):
//
//   Bounded: one task per member, each launched only after taking a
//            semaphore permit; the permit is released when the task ends.
//   Pool:    C long-lived workers pulling ids off a shared job queue.
//
// Both strategies fill the same aggregator and the same id-indexed slots,
// so the frozen tables and the member list are identical whichever one
// ran. `fetch_collection` returns only after every task has finished;
// that return is the barrier before scoring.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::throttle::Throttle;
use crate::metadata::traits::MetadataSource;
use crate::models::{Collection, Member, MemberId};
use crate::stats::aggregator::Aggregator;
use crate::stats::tables::FrequencyTables;

/// Default number of in-flight fetches.
pub const DEFAULT_CONCURRENCY: usize = 64;

/// How concurrent fetches are launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Semaphore-guarded spawn per member.
    #[default]
    Bounded,
    /// Fixed pool of workers reading from a shared queue.
    Pool,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Bounded => "bounded",
            Strategy::Pool => "pool",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bounded" | "semaphore" => Ok(Strategy::Bounded),
            "pool" | "workers" => Ok(Strategy::Pool),
            other => Err(format!(
                "unknown fetch strategy '{other}' (expected 'bounded' or 'pool')"
            )),
        }
    }
}

/// Knobs for one fetch pass.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum fetches in flight at once. Must be at least 1.
    pub concurrency: usize,
    pub strategy: Strategy,
    pub throttle: Throttle,
    /// Draw a terminal progress bar while fetching.
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            strategy: Strategy::default(),
            throttle: Throttle::disabled(),
            show_progress: false,
        }
    }
}

/// Everything a completed fetch pass produced.
#[derive(Debug, Clone)]
pub struct Harvest {
    /// Slot `i` holds member `i + 1`, or None if its fetch failed.
    pub members: Vec<Option<Member>>,
    /// Frozen frequency tables over every member that arrived.
    pub tables: FrequencyTables,
}

impl Harvest {
    /// Members that were fetched, in id order.
    pub fn fetched(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().flatten()
    }

    pub fn fetched_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_some()).count()
    }

    /// Ids whose fetch failed, ascending.
    pub fn failed_ids(&self) -> Vec<MemberId> {
        (1..)
            .zip(&self.members)
            .filter(|(_, m)| m.is_none())
            .map(|(id, _)| id)
            .collect()
    }
}

/// Fetch every member of `collection`, feeding each arrival into a fresh
/// aggregator.
///
/// Per-member failures never fail the batch: they are logged and leave an
/// empty slot, and so does a panicking fetch. The only errors are a
/// concurrency bound outside `1..=Semaphore::MAX_PERMITS` and progress bar
/// setup.
pub async fn fetch_collection(
    source: Arc<dyn MetadataSource>,
    collection: &Collection,
    options: &FetchOptions,
) -> Result<Harvest> {
    if options.concurrency == 0 {
        anyhow::bail!("Concurrency must be at least 1");
    }
    if options.concurrency > Semaphore::MAX_PERMITS {
        anyhow::bail!(
            "Concurrency {} exceeds the maximum of {}",
            options.concurrency,
            Semaphore::MAX_PERMITS
        );
    }

    info!(
        collection = collection.slug.as_str(),
        size = collection.size,
        concurrency = options.concurrency,
        strategy = %options.strategy,
        "Fetching collection metadata"
    );

    let pb = progress_bar(collection.size, options.show_progress)?;
    let aggregator = Arc::new(Aggregator::new());
    let slug: Arc<str> = Arc::from(collection.slug.as_str());

    let members = match options.strategy {
        Strategy::Bounded => {
            run_bounded(source, collection, options, &slug, &aggregator, &pb).await?
        }
        Strategy::Pool => run_pool(source, collection, options, &slug, &aggregator, &pb).await,
    };
    pb.finish_and_clear();

    let observed = aggregator.members_observed();

    // All tasks are joined, so this is normally the last reference.
    let tables = match Arc::try_unwrap(aggregator) {
        Ok(aggregator) => aggregator.finish(),
        Err(shared) => shared.snapshot(),
    };

    let harvest = Harvest { members, tables };
    info!(
        fetched = harvest.fetched_count(),
        observed,
        failed = harvest.members.len() - harvest.fetched_count(),
        "Fetch pass complete"
    );
    Ok(harvest)
}

/// One member's unit of work: fetch, then observe before reporting arrival.
async fn fetch_and_observe(
    source: &dyn MetadataSource,
    slug: &str,
    id: MemberId,
    aggregator: &Aggregator,
) -> Option<Member> {
    debug!(id, "Getting member");
    match source.fetch_traits(slug, id).await {
        Ok(traits) => {
            let member = Member::new(id, traits);
            aggregator.observe(&member);
            Some(member)
        }
        Err(e) => {
            warn!(id, error = %format!("{e:#}"), "Failed to fetch member, skipping");
            None
        }
    }
}

/// `fetch_and_observe` with a panic in the source turned into a failed slot.
async fn fetch_guarded(
    source: &dyn MetadataSource,
    slug: &str,
    id: MemberId,
    aggregator: &Aggregator,
) -> Option<Member> {
    match AssertUnwindSafe(fetch_and_observe(source, slug, id, aggregator))
        .catch_unwind()
        .await
    {
        Ok(member) => member,
        Err(_) => {
            warn!(id, "Fetch panicked, member left empty");
            None
        }
    }
}

fn place(slots: &mut [Option<Member>], collection: &Collection, id: MemberId, member: Option<Member>) {
    match collection.slot(id) {
        Some(i) => slots[i] = member,
        None => warn!(id, "Fetched member id outside collection range, dropping"),
    }
}

async fn run_bounded(
    source: Arc<dyn MetadataSource>,
    collection: &Collection,
    options: &FetchOptions,
    slug: &Arc<str>,
    aggregator: &Arc<Aggregator>,
    pb: &ProgressBar,
) -> Result<Vec<Option<Member>>> {
    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let mut tasks = JoinSet::new();

    for (seq, id) in (1..).zip(collection.ids()) {
        options.throttle.before_launch(seq).await;

        // Acquire before spawning so at most C tasks ever exist at once
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("Fetch semaphore closed")?;

        let source = Arc::clone(&source);
        let slug = Arc::clone(slug);
        let aggregator = Arc::clone(aggregator);
        let pb = pb.clone();
        tasks.spawn(async move {
            let member = fetch_guarded(source.as_ref(), &slug, id, &aggregator).await;
            pb.inc(1);
            drop(permit);
            (id, member)
        });
    }

    let mut slots = vec![None; collection.size as usize];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, member)) => place(&mut slots, collection, id, member),
            Err(e) => warn!(error = %e, "Fetch task aborted, member left empty"),
        }
    }
    Ok(slots)
}

async fn run_pool(
    source: Arc<dyn MetadataSource>,
    collection: &Collection,
    options: &FetchOptions,
    slug: &Arc<str>,
    aggregator: &Arc<Aggregator>,
    pb: &ProgressBar,
) -> Vec<Option<Member>> {
    // No point in more workers than members; keep at least one so the
    // channel capacity is non-zero.
    let pool_size = options.concurrency.min(collection.size as usize).max(1);
    let (job_tx, job_rx) = mpsc::channel::<MemberId>(pool_size.saturating_mul(2));
    let job_rx = Arc::new(Mutex::new(job_rx));
    // Unbounded so workers never stall on a full result queue while the
    // feeder below is still enqueueing.
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(MemberId, Option<Member>)>();

    let workers: Vec<_> = (1..=pool_size)
        .map(|worker_id| {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let source = Arc::clone(&source);
            let slug = Arc::clone(slug);
            let aggregator = Arc::clone(aggregator);
            let pb = pb.clone();
            tokio::spawn(async move {
                loop {
                    let next = jobs.lock().await.recv().await;
                    let Some(id) = next else { break };
                    let member = fetch_guarded(source.as_ref(), &slug, id, &aggregator).await;
                    pb.inc(1);
                    if results.send((id, member)).is_err() {
                        break;
                    }
                }
                debug!(worker_id, "Fetch worker finished");
            })
        })
        .collect();
    // Workers hold the only receivers now: if they all exit, sends below fail
    // instead of blocking on a full queue.
    drop(job_rx);
    drop(result_tx);

    for (seq, id) in (1..).zip(collection.ids()) {
        options.throttle.before_launch(seq).await;
        if job_tx.send(id).await.is_err() {
            warn!(id, "All fetch workers exited early, stopping job feed");
            break;
        }
    }
    drop(job_tx);

    let mut slots = vec![None; collection.size as usize];
    while let Some((id, member)) = result_rx.recv().await {
        place(&mut slots, collection, id, member);
    }

    for joined in futures::future::join_all(workers).await {
        if let Err(e) = joined {
            warn!(error = %e, "Fetch worker aborted");
        }
    }
    slots
}

fn progress_bar(len: u32, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(u64::from(len));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Fetching [{bar:30}] {pos}/{len} ({eta})")
            .context("Invalid progress bar template")?,
    );
    Ok(pb)
}
