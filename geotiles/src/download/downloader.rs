//! Plan realization against a byte budget.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::budget::DownloadBudget;
use super::error::DownloadError;
use super::policy::DownloadPolicy;
use super::report::DownloadReport;
use super::strategy::{
    FetchContext, FetchStrategy, ParallelStrategy, SequentialStrategy, TileOutcome,
};
use crate::tileset::PlannedTile;

/// Realizes a plan as local files.
///
/// Individual fetch failures are tolerated and counted; the operation
/// fails only when no file at all was obtained.
#[derive(Debug, Default)]
pub struct TileDownloader {
    policy: DownloadPolicy,
}

impl TileDownloader {
    pub fn new(policy: DownloadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DownloadPolicy {
        &self.policy
    }

    fn strategy(&self) -> Box<dyn FetchStrategy> {
        if self.policy.parallel <= 1 {
            Box::new(SequentialStrategy::new())
        } else {
            Box::new(ParallelStrategy::new(self.policy.parallel))
        }
    }

    /// Downloads `plan` in plan order within `budget`.
    pub fn download(
        &self,
        plan: &[PlannedTile],
        budget: DownloadBudget,
        ctx: &FetchContext<'_>,
    ) -> Result<DownloadReport, DownloadError> {
        if plan.is_empty() {
            return Err(DownloadError::EmptyPlan);
        }

        let cap = budget.cap();
        let budget = Mutex::new(budget);
        let outcomes = self.strategy().execute(plan, &budget, ctx, &self.policy);
        let budget = budget.into_inner();

        let mut report = DownloadReport {
            total_bytes: budget.total_bytes(),
            skipped_for_cap: budget.skipped_for_cap(),
            ..DownloadReport::default()
        };
        for outcome in outcomes {
            match outcome {
                TileOutcome::Fetched(tile) => {
                    if tile.from_cache {
                        report.cache_hits += 1;
                    }
                    report.files.push(tile);
                }
                TileOutcome::Failed(failure) => {
                    report.failed += 1;
                    if report.first_failure.is_none() {
                        report.first_failure = Some(failure);
                    }
                }
                TileOutcome::NotAttempted => report.not_attempted += 1,
                TileOutcome::SkippedForCap => {}
            }
        }

        if report.files.is_empty() {
            let planned = plan.len();
            if ctx.cancel.is_cancelled() {
                return Err(DownloadError::Cancelled { planned });
            }
            if let Some(failure) = report.first_failure {
                return Err(DownloadError::AllFailed {
                    planned,
                    uri: failure.uri,
                    reason: failure.reason,
                });
            }
            return Err(DownloadError::BudgetExhausted {
                planned,
                cap: cap.unwrap_or(0),
            });
        }

        if report.failed > 0 {
            warn!(failed = report.failed, planned = plan.len(), "Some tiles failed to download");
        }
        info!(
            files = report.files.len(),
            bytes = report.total_bytes,
            skipped = report.skipped_for_cap,
            cache_hits = report.cache_hits,
            "Download complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::CancelToken;
    use crate::tileset::testing::{region, InMemoryService};
    use crate::tileset::Refine;
    use tempfile::TempDir;

    fn plan(uris: &[&str]) -> Vec<PlannedTile> {
        uris.iter()
            .map(|uri| PlannedTile {
                uri: uri.to_string(),
                depth: 1,
                bounding_volume: region(0.0, 0.0, 1.0, 1.0),
                refine: Refine::Replace,
            })
            .collect()
    }

    fn run(
        service: &InMemoryService,
        plan: &[PlannedTile],
        budget: DownloadBudget,
        policy: DownloadPolicy,
    ) -> Result<DownloadReport, DownloadError> {
        let temp = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        let ctx = FetchContext {
            service,
            cache_dir: temp.path(),
            allow_network: true,
            cancel: &cancel,
        };
        TileDownloader::new(policy).download(plan, budget, &ctx)
    }

    #[test]
    fn test_total_failure_reports_count_and_first_uri() {
        let service = InMemoryService::default();
        let err = run(
            &service,
            &plan(&["https://tiles/x.glb", "https://tiles/y.glb", "https://tiles/z.glb"]),
            DownloadBudget::unbounded(),
            DownloadPolicy::default(),
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains('3'), "{}", message);
        assert!(message.contains("https://tiles/x.glb"), "{}", message);
        assert!(matches!(err, DownloadError::AllFailed { planned: 3, .. }));
    }

    #[test]
    fn test_partial_failure_is_success() {
        let service = InMemoryService::default().with_tile("ok.glb", 5);
        let report = run(
            &service,
            &plan(&["bad.glb", "ok.glb"]),
            DownloadBudget::unbounded(),
            DownloadPolicy::default(),
        )
        .unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.first_failure.as_ref().unwrap().uri, "bad.glb");
        assert_eq!(report.total_bytes, 5);
    }

    #[test]
    fn test_first_tile_over_budget_is_exhaustion() {
        let service = InMemoryService::default().with_tile("big.glb", 500);
        let err = run(
            &service,
            &plan(&["big.glb"]),
            DownloadBudget::with_cap(100),
            DownloadPolicy::default(),
        )
        .unwrap_err();

        assert_eq!(err, DownloadError::BudgetExhausted { planned: 1, cap: 100 });
    }

    #[test]
    fn test_empty_plan() {
        let service = InMemoryService::default();
        let err = run(&service, &[], DownloadBudget::unbounded(), DownloadPolicy::default())
            .unwrap_err();
        assert_eq!(err, DownloadError::EmptyPlan);
    }

    #[test]
    fn test_parallel_first_failure_is_lowest_index() {
        let service = InMemoryService::default().with_tile("ok.glb", 1);
        let report = run(
            &service,
            &plan(&["ok.glb", "bad-1.glb", "bad-2.glb", "bad-3.glb"]),
            DownloadBudget::unbounded(),
            DownloadPolicy::default().with_parallel(4),
        )
        .unwrap();

        assert_eq!(report.failed, 3);
        assert_eq!(report.first_failure.unwrap().uri, "bad-1.glb");
    }

    mod property_tests {
        use super::*;
        use crate::download::OverflowPolicy;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_budget_never_exceeded(
                sizes in proptest::collection::vec(1usize..200, 1..12),
                cap in 1u64..1000,
                skip in any::<bool>(),
                probes in any::<bool>(),
                parallel in 1usize..4
            ) {
                let uris: Vec<String> = (0..sizes.len()).map(|i| format!("t{}.glb", i)).collect();
                let mut service = InMemoryService::default();
                for (uri, size) in uris.iter().zip(&sizes) {
                    service = service.with_tile(uri, *size);
                }
                if probes {
                    service = service.with_probes();
                }
                let refs: Vec<&str> = uris.iter().map(String::as_str).collect();
                let overflow = if skip { OverflowPolicy::SkipAndContinue } else { OverflowPolicy::Stop };
                let policy = DownloadPolicy::default().with_overflow(overflow).with_parallel(parallel);

                match run(&service, &plan(&refs), DownloadBudget::with_cap(cap), policy) {
                    Ok(report) => {
                        prop_assert!(report.total_bytes <= cap);
                        prop_assert!(report.skipped_for_cap + report.files.len() <= sizes.len());
                        let sum: u64 = report.files.iter().map(|f| f.bytes).sum();
                        prop_assert_eq!(sum, report.total_bytes);
                    }
                    Err(e) => {
                        prop_assert!(matches!(e, DownloadError::BudgetExhausted { .. }), "unexpected error: {}", e);
                    }
                }
            }
        }
    }
}
