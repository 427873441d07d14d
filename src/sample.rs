use serde::{Deserialize, Serialize};

/// Metrics a record carries statistics for, in persisted-name order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Elapsed,
    Instructions,
    CpuCycles,
    ContextSwitches,
    PageFaults,
    BranchInstructions,
    BranchMisses,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Elapsed,
        Metric::Instructions,
        Metric::CpuCycles,
        Metric::ContextSwitches,
        Metric::PageFaults,
        Metric::BranchInstructions,
        Metric::BranchMisses,
    ];

    pub const COUNTERS: [Metric; 6] = [
        Metric::Instructions,
        Metric::CpuCycles,
        Metric::ContextSwitches,
        Metric::PageFaults,
        Metric::BranchInstructions,
        Metric::BranchMisses,
    ];

    /// Name used inside `median(...)` and `medianAbsolutePercentError(...)`.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Elapsed => "elapsed",
            Metric::Instructions => "instructions",
            Metric::CpuCycles => "cpucycles",
            Metric::ContextSwitches => "contextswitches",
            Metric::PageFaults => "pagefaults",
            Metric::BranchInstructions => "branchinstructions",
            Metric::BranchMisses => "branchmisses",
        }
    }
}

/// Raw hardware counter readings over one batch. `None` means the host did
/// not report the counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterTotals {
    pub pagefaults: Option<u64>,
    pub cpucycles: Option<u64>,
    pub contextswitches: Option<u64>,
    pub instructions: Option<u64>,
    pub branchinstructions: Option<u64>,
    pub branchmisses: Option<u64>,
}

impl CounterTotals {
    pub fn get(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::Elapsed => None,
            Metric::Instructions => self.instructions,
            Metric::CpuCycles => self.cpucycles,
            Metric::ContextSwitches => self.contextswitches,
            Metric::PageFaults => self.pagefaults,
            Metric::BranchInstructions => self.branchinstructions,
            Metric::BranchMisses => self.branchmisses,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<u64>) {
        match metric {
            Metric::Elapsed => {}
            Metric::Instructions => self.instructions = value,
            Metric::CpuCycles => self.cpucycles = value,
            Metric::ContextSwitches => self.contextswitches = value,
            Metric::PageFaults => self.pagefaults = value,
            Metric::BranchInstructions => self.branchinstructions = value,
            Metric::BranchMisses => self.branchmisses = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Metric::COUNTERS.iter().all(|m| self.get(*m).is_none())
    }
}

/// Per-iteration counter values of one sample, as persisted. Fractional
/// values are expected: a batch of three runs with 10 page faults stores
/// `3.333...`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagefaults: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpucycles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextswitches: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branchinstructions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branchmisses: Option<f64>,
}

impl CounterValues {
    /// Divide every reported total by `iterations`.
    pub fn per_iteration(totals: &CounterTotals, iterations: u64) -> Self {
        let mut values = Self::default();
        let divisor = iterations.max(1) as f64;
        for metric in Metric::COUNTERS {
            values.set(metric, totals.get(metric).map(|total| total as f64 / divisor));
        }
        values
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Elapsed => None,
            Metric::Instructions => self.instructions,
            Metric::CpuCycles => self.cpucycles,
            Metric::ContextSwitches => self.contextswitches,
            Metric::PageFaults => self.pagefaults,
            Metric::BranchInstructions => self.branchinstructions,
            Metric::BranchMisses => self.branchmisses,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Elapsed => {}
            Metric::Instructions => self.instructions = value,
            Metric::CpuCycles => self.cpucycles = value,
            Metric::ContextSwitches => self.contextswitches = value,
            Metric::PageFaults => self.pagefaults = value,
            Metric::BranchInstructions => self.branchinstructions = value,
            Metric::BranchMisses => self.branchmisses = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Metric::COUNTERS.iter().all(|m| self.get(*m).is_none())
    }
}

/// One epoch: a batch of `iterations` runs and what each run cost on average.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub iterations: u64,
    /// Wall time per iteration, in seconds.
    #[serde(default)]
    pub elapsed: f64,
    #[serde(flatten)]
    pub counters: CounterValues,
}

impl Sample {
    /// Record a batch; `totals` are the counter readings over the whole batch.
    pub fn new(iterations: u64, elapsed: f64, totals: CounterTotals) -> Self {
        Self {
            iterations,
            elapsed,
            counters: CounterValues::per_iteration(&totals, iterations),
        }
    }

    /// Per-iteration value of `metric`, if recorded.
    pub fn per_iteration(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Elapsed => Some(self.elapsed),
            counter => self.counters.get(counter),
        }
    }
}
