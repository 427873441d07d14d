//! Adaptive sampling of one target.
//!
//! The sampler grows the batch size until a batch spans enough clock ticks to
//! be trusted, then records one [`Sample`] per epoch until the requested epoch
//! count is reached or the running median stops moving.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::BenchError;
use crate::clock;
use crate::config::SamplerConfig;
use crate::counters::HardwareCounters;
use crate::sample::{CounterTotals, Sample};
use crate::stats;
use crate::workload::Workload;

/// Outcome of sampling one target.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRun {
    /// Samples in execution order.
    pub samples: Vec<Sample>,
    /// Wall time spent, including warm-up and rejected batches.
    pub total_time: Duration,
    /// Batch size of the last accepted epoch.
    pub epoch_iterations: u64,
    pub clock_resolution: Duration,
    /// Batches thrown away for falling short of the target epoch time.
    pub rejected_batches: u64,
    /// Whether sampling stopped early on a stable median.
    pub converged: bool,
}

pub struct Sampler {
    config: SamplerConfig,
    clock_resolution: Duration,
    counters: HardwareCounters,
}

impl Sampler {
    /// Validate `config`, probe the clock and open hardware counters.
    pub fn new(config: SamplerConfig) -> Result<Self, BenchError> {
        config.validate()?;
        let clock_resolution = clock::measure_resolution();
        let counters = if config.hardware_counters {
            HardwareCounters::open()
        } else {
            HardwareCounters::disabled()
        };
        debug!(
            resolution_ns = clock_resolution.as_nanos() as u64,
            counters = ?counters.metrics(),
            "sampler ready"
        );
        Ok(Self {
            config,
            clock_resolution,
            counters,
        })
    }

    /// Build a sampler with a known clock resolution and explicit counters.
    pub fn with_parts(
        config: SamplerConfig,
        clock_resolution: Duration,
        counters: HardwareCounters,
    ) -> Result<Self, BenchError> {
        config.validate()?;
        Ok(Self {
            config,
            clock_resolution,
            counters,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn clock_resolution(&self) -> Duration {
        self.clock_resolution
    }

    pub fn target_epoch_time(&self) -> Duration {
        self.config.target_epoch_time(self.clock_resolution)
    }

    /// Sample `workload` until the series is accepted. Invocation failures are
    /// returned at once, tagged with `target`.
    pub fn run<W>(&mut self, target: &str, workload: &mut W) -> Result<SampleRun, BenchError>
    where
        W: Workload + ?Sized,
    {
        let started = Instant::now();
        for _ in 0..self.config.warmup {
            invoke(target, workload)?;
        }

        let target_time = self.target_epoch_time();
        let fixed = self.config.epoch_iterations > 0;
        let mut iterations = if fixed {
            self.config.epoch_iterations
        } else {
            self.config.min_epoch_iterations.max(1)
        };
        let mut samples: Vec<Sample> = Vec::with_capacity(self.config.epochs as usize);
        let mut elapsed_series: Vec<f64> = Vec::with_capacity(self.config.epochs as usize);
        let mut previous_median: Option<f64> = None;
        let mut rejected_batches = 0u64;
        let mut converged = false;
        // Smallest batch size seen to overrun max_epoch_time.
        let mut overrun_at = u64::MAX;
        let max_epoch_time = self.config.max_epoch_time;

        while (samples.len() as u64) < self.config.epochs {
            let (elapsed, counters) = self.measure_batch(target, workload, iterations)?;
            if !fixed && elapsed > max_epoch_time && iterations > 1 {
                overrun_at = overrun_at.min(iterations);
                let shrunk = shrink_batch_size(iterations, elapsed, max_epoch_time);
                debug!(
                    target_file = target,
                    iterations,
                    shrunk,
                    elapsed_ns = elapsed.as_nanos() as u64,
                    "batch above max epoch time"
                );
                iterations = shrunk;
                rejected_batches += 1;
                continue;
            }
            if !fixed && elapsed < target_time {
                let grown = next_batch_size(iterations, elapsed, target_time, max_epoch_time)
                    .map(|next| next.min(overrun_at - 1))
                    .filter(|next| *next > iterations);
                if let Some(grown) = grown {
                    debug!(
                        target_file = target,
                        iterations,
                        grown,
                        elapsed_ns = elapsed.as_nanos() as u64,
                        "batch below target epoch time"
                    );
                    iterations = grown;
                    rejected_batches += 1;
                    continue;
                }
                // No larger batch fits under max_epoch_time; keep this one.
            }

            let per_iteration = elapsed.as_secs_f64() / iterations as f64;
            samples.push(Sample::new(iterations, per_iteration, counters));
            elapsed_series.push(per_iteration);

            let running = stats::median(&elapsed_series).unwrap_or(per_iteration);
            if let (Some(tolerance), Some(previous)) = (self.config.convergence, previous_median) {
                let enough = samples.len() as u64 >= self.config.min_epochs.max(2);
                let stable = stats::relative_change(previous, running)
                    .is_some_and(|change| change.abs() < tolerance);
                if enough && stable {
                    converged = true;
                    break;
                }
            }
            previous_median = Some(running);
        }

        let run = SampleRun {
            samples,
            total_time: started.elapsed(),
            epoch_iterations: iterations,
            clock_resolution: self.clock_resolution,
            rejected_batches,
            converged,
        };
        debug!(
            target_file = target,
            epochs = run.samples.len(),
            iterations = run.epoch_iterations,
            rejected = run.rejected_batches,
            converged = run.converged,
            "sampling finished"
        );
        Ok(run)
    }

    fn measure_batch<W>(
        &mut self,
        target: &str,
        workload: &mut W,
        iterations: u64,
    ) -> Result<(Duration, CounterTotals), BenchError>
    where
        W: Workload + ?Sized,
    {
        if let Err(err) = self.counters.start() {
            warn!(%err, "disabling hardware counters");
            self.counters = HardwareCounters::disabled();
        }
        let start = Instant::now();
        for _ in 0..iterations {
            invoke(target, workload)?;
        }
        let elapsed = start.elapsed();
        let counters = match self.counters.stop() {
            Ok(totals) => totals,
            Err(err) => {
                warn!(%err, "disabling hardware counters");
                self.counters = HardwareCounters::disabled();
                CounterTotals::default()
            }
        };
        Ok((elapsed, counters))
    }
}

fn invoke<W>(target: &str, workload: &mut W) -> Result<(), BenchError>
where
    W: Workload + ?Sized,
{
    workload.run().map_err(|err| {
        if err.is_target_scoped() {
            err
        } else {
            BenchError::invocation(target, err.to_string())
        }
    })
}

/// Batch size for the next attempt after a batch of `iterations` took
/// `elapsed`, short of `target`. `None` when no larger batch is expected to
/// stay within `max`.
pub fn next_batch_size(
    iterations: u64,
    elapsed: Duration,
    target: Duration,
    max: Duration,
) -> Option<u64> {
    let iterations = iterations.max(1);
    if elapsed.is_zero() {
        return Some(iterations.saturating_mul(10));
    }
    let per_iteration = elapsed.as_secs_f64() / iterations as f64;
    let ceiling = (max.as_secs_f64() / per_iteration).floor() as u64;
    let wanted = if elapsed.saturating_mul(10) < target {
        iterations.saturating_mul(10)
    } else {
        ((target.as_secs_f64() * 1.2 / per_iteration).ceil() as u64)
            .max(iterations.saturating_mul(2))
    };
    let next = wanted.min(ceiling);
    (next > iterations).then_some(next)
}

/// Largest batch expected to fit in `max` after `iterations` took `elapsed`,
/// always smaller than `iterations` and at least one.
pub fn shrink_batch_size(iterations: u64, elapsed: Duration, max: Duration) -> u64 {
    let per_iteration = elapsed.as_secs_f64() / iterations.max(1) as f64;
    let fits = (max.as_secs_f64() / per_iteration).floor() as u64;
    fits.clamp(1, iterations.saturating_sub(1).max(1))
}
