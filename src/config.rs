//! Configuration for sampling, baseline comparison and the benchmark driver.
//!
//! Every structure here carries documented defaults so a harness can be built
//! with `Default::default()` and tuned field by field. The command-line binary
//! fills these structures from its flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::BenchError;

/// Options controlling how the [`Sampler`](crate::sampler::Sampler) batches and
/// repeats a target.
///
/// # Default Configuration
///
/// ```rust
/// use std::time::Duration;
/// use filebench::SamplerConfig;
///
/// let config = SamplerConfig::default();
/// assert_eq!(config.epochs, 11);
/// assert_eq!(config.clock_resolution_multiple, 1000);
/// assert_eq!(config.max_epoch_time, Duration::from_millis(100));
/// assert_eq!(config.warmup, 0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Number of epochs to collect when the series never converges early.
    ///
    /// **Default:** `11`
    pub epochs: u64,

    /// Lower bound on the wall time of an epoch before it is trusted.
    ///
    /// **Default:** 1 ms
    pub min_epoch_time: Duration,

    /// Upper bound used when growing a batch, to avoid runaway epochs.
    ///
    /// **Default:** 100 ms
    ///
    /// A single iteration that is already slower than this is still accepted,
    /// since a batch cannot hold fewer than one iteration.
    pub max_epoch_time: Duration,

    /// Minimum number of clock ticks an epoch must span.
    ///
    /// **Default:** `1000`
    pub clock_resolution_multiple: u64,

    /// Smallest batch size the sampler starts calibrating from.
    ///
    /// **Default:** `1`
    pub min_epoch_iterations: u64,

    /// Fixed number of iterations per epoch. `0` calibrates automatically.
    ///
    /// **Default:** `0`
    pub epoch_iterations: u64,

    /// Iterations executed and discarded before measuring.
    ///
    /// **Default:** `0`
    pub warmup: u64,

    /// Relative change of the running median below which sampling stops early.
    ///
    /// **Default:** `Some(0.01)`
    ///
    /// Set to `None` to always collect exactly [`epochs`](Self::epochs) epochs.
    pub convergence: Option<f64>,

    /// Epochs that must be collected before the convergence check may stop
    /// sampling.
    ///
    /// **Default:** `5`
    pub min_epochs: u64,

    /// Collect hardware counters when the host supports them.
    ///
    /// **Default:** `true`
    pub hardware_counters: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            epochs: 11,
            min_epoch_time: Duration::from_millis(1),
            max_epoch_time: Duration::from_millis(100),
            clock_resolution_multiple: 1000,
            min_epoch_iterations: 1,
            epoch_iterations: 0,
            warmup: 0,
            convergence: Some(0.01),
            min_epochs: 5,
            hardware_counters: true,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.epochs == 0 {
            return Err(BenchError::invalid_input("epochs must be at least 1"));
        }
        if self.min_epoch_time > self.max_epoch_time {
            return Err(BenchError::invalid_input(format!(
                "min epoch time {:?} exceeds max epoch time {:?}",
                self.min_epoch_time, self.max_epoch_time
            )));
        }
        if self.clock_resolution_multiple == 0 {
            return Err(BenchError::invalid_input(
                "clock resolution multiple must be positive",
            ));
        }
        if let Some(tolerance) = self.convergence {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(BenchError::invalid_input(format!(
                    "convergence tolerance must be a non-negative number, got {tolerance}"
                )));
            }
        }
        Ok(())
    }

    /// Wall time an epoch has to reach before it is accepted.
    pub fn target_epoch_time(&self, clock_resolution: Duration) -> Duration {
        let wanted = clock_resolution.saturating_mul(
            u32::try_from(self.clock_resolution_multiple).unwrap_or(u32::MAX),
        );
        wanted.max(self.min_epoch_time).min(self.max_epoch_time)
    }
}

/// How baseline and current records are matched up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pairing {
    /// Pair records by their index in the collection.
    ///
    /// Reordering targets between runs silently mispairs results.
    #[default]
    Positional,
    /// Pair each current record with the first baseline record of the same name.
    ByName,
}

/// Options for the baseline comparator.
///
/// ```rust
/// use filebench::{CompareConfig, Pairing};
///
/// let config = CompareConfig::default();
/// assert_eq!(config.threshold, 0.05);
/// assert_eq!(config.pairing, Pairing::Positional);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompareConfig {
    /// Relative change in median elapsed time below which a pair is unchanged.
    ///
    /// **Default:** `0.05` (5%)
    pub threshold: f64,

    /// **Default:** [`Pairing::Positional`]
    pub pairing: Pairing,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            pairing: Pairing::Positional,
        }
    }
}

/// Options for running one target file through the external runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkloadConfig {
    /// Executable that receives the target file as its only argument.
    ///
    /// **Default:** `./target/release/aria`
    pub runtime: PathBuf,

    /// Kill the target and fail it when one invocation runs longer than this.
    ///
    /// **Default:** `Some(60s)`
    pub timeout: Option<Duration>,

    /// Treat a non-zero exit status as an invocation failure.
    ///
    /// **Default:** `false`
    pub fail_on_nonzero: bool,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            runtime: PathBuf::from("./target/release/aria"),
            timeout: Some(Duration::from_secs(60)),
            fail_on_nonzero: false,
        }
    }
}

/// Everything the driver needs for one benchmarking run.
#[derive(Clone, Debug, PartialEq)]
pub struct HarnessConfig {
    /// Title stored with every record and the collection.
    ///
    /// **Default:** `"Benchmarking Aria execution time"`
    pub title: String,

    /// Unit label stored with every record.
    ///
    /// **Default:** `"op"`
    pub unit: String,

    /// Directories scanned for targets, in order.
    pub dirs: Vec<PathBuf>,

    /// Substring a target's file name must contain. Empty matches everything.
    pub pattern: String,

    /// Extension a target must have, without the leading dot.
    ///
    /// **Default:** `"aria"`
    pub extension: String,

    /// Root directory holding the `results` and `baseline` slots.
    ///
    /// **Default:** `target/filebench`
    pub output: PathBuf,

    /// Colour regressions and improvements in the comparison table.
    ///
    /// **Default:** `true`
    pub color: bool,

    pub sampler: SamplerConfig,
    pub compare: CompareConfig,
    pub workload: WorkloadConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            title: String::from("Benchmarking Aria execution time"),
            unit: String::from("op"),
            dirs: Vec::new(),
            pattern: String::new(),
            extension: String::from("aria"),
            output: PathBuf::from("target/filebench"),
            color: true,
            sampler: SamplerConfig::default(),
            compare: CompareConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        self.sampler.validate()?;
        if !self.compare.threshold.is_finite() || self.compare.threshold < 0.0 {
            return Err(BenchError::invalid_input(format!(
                "threshold must be a non-negative number, got {}",
                self.compare.threshold
            )));
        }
        if self.extension.starts_with('.') {
            return Err(BenchError::invalid_input(format!(
                "extension {} must not start with a dot",
                self.extension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_epoch_time_clamps_to_bounds() {
        let config = SamplerConfig::default();
        assert_eq!(
            config.target_epoch_time(Duration::from_nanos(20)),
            Duration::from_millis(1)
        );
        assert_eq!(
            config.target_epoch_time(Duration::from_micros(50)),
            Duration::from_millis(50)
        );
        assert_eq!(
            config.target_epoch_time(Duration::from_millis(1)),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_validate_rejects_inverted_epoch_bounds() {
        let config = SamplerConfig {
            min_epoch_time: Duration::from_millis(200),
            ..SamplerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BenchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_harness_rejects_dotted_extension_and_negative_threshold() {
        assert!(HarnessConfig::default().validate().is_ok());
        let dotted = HarnessConfig {
            extension: ".aria".into(),
            ..HarnessConfig::default()
        };
        assert!(dotted.validate().is_err());
        let mut negative = HarnessConfig::default();
        negative.compare.threshold = -0.1;
        assert!(negative.validate().is_err());
    }
}
