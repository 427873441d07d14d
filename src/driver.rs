//! Sequential benchmark driver.
//!
//! Targets run one after another in discovery order; a failing target is
//! recorded and skipped, never aborting the others. Only storage failures end
//! the run early.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::BenchError;
use crate::compare::{self, ComparisonReport};
use crate::config::HarnessConfig;
use crate::discover;
use crate::result::{RecordLabels, ResultCollection, ResultRecord};
use crate::sampler::Sampler;
use crate::store::{Confirm, ResultStore, Slot};
use crate::workload::{ProcessWorkload, Workload};

/// A target that produced no record.
#[derive(Debug)]
pub struct TargetFailure {
    pub target: String,
    pub error: BenchError,
}

/// Records and failures of one pass over the targets.
#[derive(Debug, Default)]
pub struct SuiteOutcome {
    pub collection: ResultCollection,
    pub failures: Vec<TargetFailure>,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub outcome: SuiteOutcome,
    /// `None` when the stored baseline could not be parsed.
    pub comparison: Option<ComparisonReport>,
    pub promoted: bool,
}

pub struct Harness {
    config: HarnessConfig,
    store: ResultStore,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Result<Self, BenchError> {
        config.validate()?;
        let store = ResultStore::new(config.output.clone());
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn discover(&self) -> Result<Vec<PathBuf>, BenchError> {
        if self.config.dirs.is_empty() {
            return Err(BenchError::invalid_input(
                "at least one benchmark directory is required",
            ));
        }
        discover::discover_targets(
            &self.config.dirs,
            &self.config.pattern,
            &self.config.extension,
        )
    }

    /// Sample every target in order.
    pub fn measure<F, W>(
        &self,
        sampler: &mut Sampler,
        targets: &[PathBuf],
        mut make_workload: F,
    ) -> SuiteOutcome
    where
        F: FnMut(&Path) -> W,
        W: Workload,
    {
        let mut outcome = SuiteOutcome {
            collection: ResultCollection::new(self.config.title.clone()),
            failures: Vec::new(),
        };
        for (idx, target) in targets.iter().enumerate() {
            let name = target.display().to_string();
            info!(target_file = %name, index = idx + 1, total = targets.len(), "benchmarking");
            let mut workload = make_workload(target);
            let measured = sampler.run(&name, &mut workload).and_then(|run| {
                let labels = RecordLabels::new(self.config.title.clone(), name.clone())
                    .with_unit(self.config.unit.clone());
                ResultRecord::from_run(labels, sampler.config(), run)
            });
            match measured {
                Ok(record) => {
                    info!("{}", record.summary());
                    outcome.collection.push(record);
                }
                Err(error) => {
                    warn!(target_file = %name, %error, "target failed");
                    outcome.failures.push(TargetFailure {
                        target: name,
                        error,
                    });
                }
            }
        }
        outcome
    }

    /// Compare `current` with the stored baseline. A missing baseline gives
    /// an empty report; an unreadable one is an error for the caller to log.
    pub fn compare_with_baseline(
        &self,
        current: &ResultCollection,
    ) -> Result<ComparisonReport, BenchError> {
        let baseline = self.store.load(Slot::Baseline)?;
        Ok(compare::compare(
            baseline.as_ref(),
            current,
            &self.config.compare,
        ))
    }

    /// Persist results, print the comparison to `out` and offer promotion.
    pub fn finish<O: Write>(
        &self,
        outcome: SuiteOutcome,
        confirm: &mut dyn Confirm,
        out: &mut O,
    ) -> Result<RunSummary, BenchError> {
        self.store.save(Slot::Results, &outcome.collection)?;

        let comparison = match self.compare_with_baseline(&outcome.collection) {
            Ok(report) => {
                write!(out, "{}", report.render(self.config.color))
                    .map_err(|e| BenchError::storage("<stdout>", e.to_string()))?;
                Some(report)
            }
            Err(error) => {
                warn!(%error, "skipping baseline comparison");
                None
            }
        };

        let promoted = if outcome.collection.is_empty() {
            warn!("no benchmark produced a result, keeping the current baseline");
            false
        } else {
            self.store.promote(&outcome.collection, confirm)?
        };

        Ok(RunSummary {
            outcome,
            comparison,
            promoted,
        })
    }

    /// Discover targets, run each through the configured runtime and finish.
    pub fn run<O: Write>(
        &self,
        confirm: &mut dyn Confirm,
        out: &mut O,
    ) -> Result<RunSummary, BenchError> {
        let targets = self.discover()?;
        if targets.is_empty() {
            warn!(
                pattern = %self.config.pattern,
                extension = %self.config.extension,
                "no benchmark targets found"
            );
        }
        let mut sampler = Sampler::new(self.config.sampler.clone())?;
        let workload_config = self.config.workload.clone();
        let outcome = self.measure(&mut sampler, &targets, |target| {
            ProcessWorkload::new(&workload_config, target)
        });
        self.finish(outcome, confirm, out)
    }
}
