//! Fetch strategies.
//!
//! Sequential and parallel realization of a plan behind a common trait.
//! Both honour the byte budget through a shared, mutex-guarded
//! [`DownloadBudget`] so that commits are serialized.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::budget::DownloadBudget;
use super::cancel::CancelToken;
use super::policy::{DownloadPolicy, OverflowPolicy};
use super::report::{DownloadedTile, TileFailure};
use crate::provider::TilesetService;
use crate::tileset::PlannedTile;

/// Collaborators and flags shared by every fetch of one operation.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub service: &'a dyn TilesetService,
    pub cache_dir: &'a Path,
    pub allow_network: bool,
    pub cancel: &'a CancelToken,
}

/// What happened to one planned tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    Fetched(DownloadedTile),
    SkippedForCap,
    Failed(TileFailure),
    NotAttempted,
}

/// Strategy for realizing a plan.
pub trait FetchStrategy: Send + Sync {
    /// Fetches the plan, returning one outcome per planned tile in plan order.
    fn execute(
        &self,
        plan: &[PlannedTile],
        budget: &Mutex<DownloadBudget>,
        ctx: &FetchContext<'_>,
        policy: &DownloadPolicy,
    ) -> Vec<TileOutcome>;
}

/// Processes one tile. The flag is set when no further fetches may start.
fn fetch_one(
    tile: &PlannedTile,
    budget: &Mutex<DownloadBudget>,
    ctx: &FetchContext<'_>,
    policy: &DownloadPolicy,
) -> (TileOutcome, bool) {
    if ctx.cancel.is_cancelled() {
        return (TileOutcome::NotAttempted, true);
    }

    if budget.lock().exceeds_threshold(policy.probe_threshold) {
        match ctx.service.probe_content_size(&tile.uri) {
            Ok(Some(size)) => {
                let mut budget = budget.lock();
                if budget.would_exceed(size) {
                    budget.record_skip();
                    debug!(uri = %tile.uri, size, "Probed tile would exceed budget, skipping");
                    return (TileOutcome::SkippedForCap, false);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(uri = %tile.uri, error = %e, "Size probe failed, fetching anyway"),
        }
    }

    let content = match ctx
        .service
        .fetch_tile_content(&tile.uri, ctx.cache_dir, ctx.allow_network)
    {
        Ok(content) => content,
        Err(e) => {
            warn!(uri = %tile.uri, error = %e, "Tile fetch failed");
            return (
                TileOutcome::Failed(TileFailure {
                    uri: tile.uri.clone(),
                    reason: e.to_string(),
                }),
                false,
            );
        }
    };

    if !budget.lock().commit(content.bytes) {
        debug!(uri = %tile.uri, bytes = content.bytes, "Tile overflowed budget");
        let stop = policy.overflow == OverflowPolicy::Stop;
        return (TileOutcome::SkippedForCap, stop);
    }

    (
        TileOutcome::Fetched(DownloadedTile {
            uri: tile.uri.clone(),
            path: content.path,
            bytes: content.bytes,
            from_cache: content.from_cache,
        }),
        false,
    )
}

/// Fetches tiles one at a time in plan order.
#[derive(Debug, Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl FetchStrategy for SequentialStrategy {
    fn execute(
        &self,
        plan: &[PlannedTile],
        budget: &Mutex<DownloadBudget>,
        ctx: &FetchContext<'_>,
        policy: &DownloadPolicy,
    ) -> Vec<TileOutcome> {
        let mut outcomes = Vec::with_capacity(plan.len());

        for tile in plan {
            let (outcome, stop) = fetch_one(tile, budget, ctx, policy);
            outcomes.push(outcome);
            if stop {
                break;
            }
        }

        outcomes.resize(plan.len(), TileOutcome::NotAttempted);
        outcomes
    }
}

/// Fetches tiles on a bounded set of scoped worker threads.
///
/// Workers pull the next plan index from a shared counter. A stop
/// condition prevents new fetches but never interrupts one in flight.
#[derive(Debug)]
pub struct ParallelStrategy {
    /// Maximum number of concurrent fetches.
    pub concurrency: usize,
}

impl ParallelStrategy {
    /// Creates a parallel strategy with at least one worker.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new(4)
    }
}

impl FetchStrategy for ParallelStrategy {
    fn execute(
        &self,
        plan: &[PlannedTile],
        budget: &Mutex<DownloadBudget>,
        ctx: &FetchContext<'_>,
        policy: &DownloadPolicy,
    ) -> Vec<TileOutcome> {
        let next = AtomicUsize::new(0);
        let stopped = AtomicBool::new(false);
        let results: Mutex<Vec<Option<TileOutcome>>> = Mutex::new(vec![None; plan.len()]);
        let workers = self.concurrency.min(plan.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(tile) = plan.get(index) else {
                        break;
                    };

                    let (outcome, stop) = fetch_one(tile, budget, ctx, policy);
                    if stop {
                        stopped.store(true, Ordering::SeqCst);
                    }
                    results.lock()[index] = Some(outcome);
                });
            }
        });

        results
            .into_inner()
            .into_iter()
            .map(|outcome| outcome.unwrap_or(TileOutcome::NotAttempted))
            .collect()
    }
}
