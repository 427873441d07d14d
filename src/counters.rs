//! Hardware performance counters for a measured batch.
//!
//! On Linux with the `perf` feature the counters come from `perf_event` and
//! are inherited by child processes, so a subprocess target is counted too.
//! Elsewhere, or when the kernel refuses access, [`HardwareCounters::open`]
//! returns a set with nothing enabled and every reading is `None`.

use crate::sample::{CounterTotals, Metric};

#[cfg(all(target_os = "linux", feature = "perf"))]
mod imp {
    use perf_event2::events::{Event, Hardware, Software};
    use perf_event2::{Builder, Counter};
    use tracing::debug;

    use crate::BenchError;
    use crate::sample::{CounterTotals, Metric};

    pub struct PerfCounters {
        counters: Vec<(Metric, Counter)>,
    }

    impl PerfCounters {
        pub fn open() -> Self {
            let mut counters = Vec::new();
            for metric in Metric::COUNTERS {
                match build(metric) {
                    Ok(counter) => counters.push((metric, counter)),
                    Err(err) => debug!(metric = metric.key(), %err, "counter unavailable"),
                }
            }
            Self { counters }
        }

        pub fn is_enabled(&self) -> bool {
            !self.counters.is_empty()
        }

        pub fn metrics(&self) -> Vec<Metric> {
            self.counters.iter().map(|(metric, _)| *metric).collect()
        }

        pub fn start(&mut self) -> Result<(), BenchError> {
            for (metric, counter) in &mut self.counters {
                counter
                    .reset()
                    .and_then(|_| counter.enable())
                    .map_err(|e| BenchError::counter(format!("{}: {e}", metric.key())))?;
            }
            Ok(())
        }

        pub fn stop(&mut self) -> Result<CounterTotals, BenchError> {
            let mut totals = CounterTotals::default();
            for (metric, counter) in &mut self.counters {
                counter
                    .disable()
                    .map_err(|e| BenchError::counter(format!("{}: {e}", metric.key())))?;
                let value = counter
                    .read()
                    .map_err(|e| BenchError::counter(format!("{}: {e}", metric.key())))?;
                totals.set(*metric, Some(value));
            }
            Ok(totals)
        }
    }

    fn build(metric: Metric) -> std::io::Result<Counter> {
        match metric {
            Metric::Instructions => open(Hardware::INSTRUCTIONS),
            Metric::CpuCycles => open(Hardware::CPU_CYCLES),
            Metric::BranchInstructions => open(Hardware::BRANCH_INSTRUCTIONS),
            Metric::BranchMisses => open(Hardware::BRANCH_MISSES),
            Metric::PageFaults => open(Software::PAGE_FAULTS),
            Metric::ContextSwitches => open(Software::CONTEXT_SWITCHES),
            Metric::Elapsed => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "elapsed is not a hardware counter",
            )),
        }
    }

    fn open<E: Event + 'static>(event: E) -> std::io::Result<Counter> {
        Builder::new(event).inherit(true).build()
    }
}

/// The set of counters opened for one sampler.
pub struct HardwareCounters {
    #[cfg(all(target_os = "linux", feature = "perf"))]
    inner: Option<imp::PerfCounters>,
}

impl HardwareCounters {
    /// Open every counter the host allows. Never fails; unsupported counters
    /// are left out.
    pub fn open() -> Self {
        #[cfg(all(target_os = "linux", feature = "perf"))]
        {
            let inner = imp::PerfCounters::open();
            Self {
                inner: inner.is_enabled().then_some(inner),
            }
        }
        #[cfg(not(all(target_os = "linux", feature = "perf")))]
        {
            Self::disabled()
        }
    }

    pub fn disabled() -> Self {
        Self {
            #[cfg(all(target_os = "linux", feature = "perf"))]
            inner: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        #[cfg(all(target_os = "linux", feature = "perf"))]
        {
            self.inner.is_some()
        }
        #[cfg(not(all(target_os = "linux", feature = "perf")))]
        {
            false
        }
    }

    /// Reset and start counting.
    pub fn start(&mut self) -> Result<(), crate::BenchError> {
        #[cfg(all(target_os = "linux", feature = "perf"))]
        {
            if let Some(inner) = self.inner.as_mut() {
                return inner.start();
            }
        }
        Ok(())
    }

    /// Stop counting and return the totals since [`start`](Self::start).
    pub fn stop(&mut self) -> Result<CounterTotals, crate::BenchError> {
        #[cfg(all(target_os = "linux", feature = "perf"))]
        {
            if let Some(inner) = self.inner.as_mut() {
                return inner.stop();
            }
        }
        Ok(CounterTotals::default())
    }

    /// Metrics this set reports.
    pub fn metrics(&self) -> Vec<Metric> {
        #[cfg(all(target_os = "linux", feature = "perf"))]
        {
            if let Some(inner) = self.inner.as_ref() {
                return inner.metrics();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_counters_report_nothing() {
        let mut counters = HardwareCounters::disabled();
        assert!(!counters.is_enabled());
        counters.start().unwrap();
        let totals = counters.stop().unwrap();
        assert!(totals.is_empty());
        assert!(counters.metrics().is_empty());
    }
}
