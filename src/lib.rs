//! Adaptive micro-benchmark harness for running an executable over input files.
//!
//! filebench runs an external runtime once per input file, repeatedly, until the
//! timing series is stable, aggregates each file into a [`ResultRecord`] and
//! compares the run against the last saved baseline.
//!
//! # Pipeline
//!
//! - [`discover_targets`] - input files from a list of directories
//! - [`Sampler`] - adaptive batching and epoch collection for one target
//! - [`ResultRecord::from_run`] - medians and error bounds
//! - [`render`] - JSON, CSV and HTML reports
//! - [`ResultStore`] - `results` and `baseline` slots on disk
//! - [`compare()`] - per-benchmark relative change against the baseline
//! - [`Harness`] - the whole run, sequentially
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use filebench::{FixedAnswer, Harness, HarnessConfig};
//!
//! let config = HarnessConfig {
//!     dirs: vec!["tests/bench".into()],
//!     ..HarnessConfig::default()
//! };
//! let harness = Harness::new(config)?;
//! let summary = harness.run(&mut FixedAnswer(false), &mut std::io::stdout())?;
//! println!("{} benchmarks measured", summary.outcome.collection.len());
//! # Ok::<(), filebench::BenchError>(())
//! ```

pub mod clock;
pub mod compare;
pub mod config;
pub mod counters;
pub mod discover;
pub mod driver;
pub mod errors;
pub mod render;
pub mod result;
pub mod sample;
pub mod sampler;
pub mod stats;
pub mod store;
pub mod workload;

// Re-export configuration
pub use config::{CompareConfig, HarnessConfig, Pairing, SamplerConfig, WorkloadConfig};

// Re-export error types
pub use errors::BenchError;

// Re-export the measurement pipeline
pub use compare::{ComparisonEntry, ComparisonReport, Direction, compare};
pub use discover::{discover_targets, split_dirs};
pub use driver::{Harness, RunSummary, SuiteOutcome, TargetFailure};
pub use render::Format;
pub use result::{RecordLabels, ResultCollection, ResultRecord, Statistic, Statistics};
pub use sample::{CounterTotals, CounterValues, Metric, Sample};
pub use sampler::{SampleRun, Sampler};
pub use store::{Confirm, FixedAnswer, PromptConfirm, ResultStore, Slot, StdinConfirm};
pub use workload::{ProcessWorkload, Workload};
