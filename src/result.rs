//! Aggregated benchmark records and the collection persisted per run.
//!
//! Field names follow the nanobench JSON layout so existing baselines keep
//! loading. Every field is optional on load; missing numbers read as zero and
//! missing counters read as absent.

use serde::{Deserialize, Deserializer, Serialize};

use crate::BenchError;
use crate::config::SamplerConfig;
use crate::sample::{Metric, Sample};
use crate::sampler::SampleRun;
use crate::stats;

/// Median and median absolute percentage error of one metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Statistic {
    pub median: f64,
    /// Fraction of the median, e.g. `0.02` for 2%.
    pub mape: f64,
}

impl Statistic {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let median = stats::median(values)?;
        Some(Self {
            median,
            mape: stats::median_absolute_percent_error(values),
        })
    }

    pub fn mape_percent(&self) -> f64 {
        self.mape * 100.0
    }
}

/// Statistics block of a record, serialized with the
/// `median(<metric>)` / `medianAbsolutePercentError(<metric>)` convention.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "median(elapsed)", default)]
    pub median_elapsed: f64,
    #[serde(rename = "medianAbsolutePercentError(elapsed)", default)]
    pub mape_elapsed: f64,
    #[serde(rename = "median(instructions)", default, skip_serializing_if = "Option::is_none")]
    pub median_instructions: Option<f64>,
    #[serde(
        rename = "medianAbsolutePercentError(instructions)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mape_instructions: Option<f64>,
    #[serde(rename = "median(cpucycles)", default, skip_serializing_if = "Option::is_none")]
    pub median_cpucycles: Option<f64>,
    #[serde(
        rename = "medianAbsolutePercentError(cpucycles)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mape_cpucycles: Option<f64>,
    #[serde(
        rename = "median(contextswitches)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub median_contextswitches: Option<f64>,
    #[serde(
        rename = "medianAbsolutePercentError(contextswitches)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mape_contextswitches: Option<f64>,
    #[serde(rename = "median(pagefaults)", default, skip_serializing_if = "Option::is_none")]
    pub median_pagefaults: Option<f64>,
    #[serde(
        rename = "medianAbsolutePercentError(pagefaults)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mape_pagefaults: Option<f64>,
    #[serde(
        rename = "median(branchinstructions)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub median_branchinstructions: Option<f64>,
    #[serde(
        rename = "medianAbsolutePercentError(branchinstructions)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mape_branchinstructions: Option<f64>,
    #[serde(rename = "median(branchmisses)", default, skip_serializing_if = "Option::is_none")]
    pub median_branchmisses: Option<f64>,
    #[serde(
        rename = "medianAbsolutePercentError(branchmisses)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mape_branchmisses: Option<f64>,
}

impl Statistics {
    /// Statistic for `metric`, `None` when the metric was never recorded.
    pub fn get(&self, metric: Metric) -> Option<Statistic> {
        let (median, mape) = match metric {
            Metric::Elapsed => (Some(self.median_elapsed), Some(self.mape_elapsed)),
            Metric::Instructions => (self.median_instructions, self.mape_instructions),
            Metric::CpuCycles => (self.median_cpucycles, self.mape_cpucycles),
            Metric::ContextSwitches => (self.median_contextswitches, self.mape_contextswitches),
            Metric::PageFaults => (self.median_pagefaults, self.mape_pagefaults),
            Metric::BranchInstructions => {
                (self.median_branchinstructions, self.mape_branchinstructions)
            }
            Metric::BranchMisses => (self.median_branchmisses, self.mape_branchmisses),
        };
        Some(Statistic {
            median: median?,
            mape: mape.unwrap_or(0.0),
        })
    }

    pub fn set(&mut self, metric: Metric, stat: Option<Statistic>) {
        let median = stat.map(|s| s.median);
        let mape = stat.map(|s| s.mape);
        match metric {
            Metric::Elapsed => {
                self.median_elapsed = median.unwrap_or(0.0);
                self.mape_elapsed = mape.unwrap_or(0.0);
            }
            Metric::Instructions => {
                self.median_instructions = median;
                self.mape_instructions = mape;
            }
            Metric::CpuCycles => {
                self.median_cpucycles = median;
                self.mape_cpucycles = mape;
            }
            Metric::ContextSwitches => {
                self.median_contextswitches = median;
                self.mape_contextswitches = mape;
            }
            Metric::PageFaults => {
                self.median_pagefaults = median;
                self.mape_pagefaults = mape;
            }
            Metric::BranchInstructions => {
                self.median_branchinstructions = median;
                self.mape_branchinstructions = mape;
            }
            Metric::BranchMisses => {
                self.median_branchmisses = median;
                self.mape_branchmisses = mape;
            }
        }
    }

    /// Summarise `samples`. Counters absent from every sample stay absent.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut statistics = Self::default();
        for metric in Metric::ALL {
            let values: Vec<f64> = samples
                .iter()
                .filter_map(|sample| sample.per_iteration(metric))
                .collect();
            statistics.set(metric, Statistic::from_values(&values));
        }
        statistics
    }
}

/// Aggregated outcome for one benchmarked target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultRecord {
    pub title: String,
    pub name: String,
    pub unit: String,
    pub batch: f64,
    #[serde(rename = "complexityN")]
    pub complexity_n: f64,
    pub epochs: u64,
    /// Seconds.
    pub clock_resolution: f64,
    pub clock_resolution_multiple: u64,
    /// Seconds.
    pub max_epoch_time: f64,
    /// Seconds.
    pub min_epoch_time: f64,
    pub min_epoch_iterations: u64,
    pub epoch_iterations: u64,
    pub warmup: u64,
    #[serde(deserialize_with = "flag")]
    pub relative: bool,
    #[serde(flatten)]
    pub statistics: Statistics,
    /// Seconds spent measuring, warm-up included.
    pub total_time: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<Sample>,
}

/// nanobench writes booleans as `0` / `1`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(f64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Number(value) => value != 0.0,
    })
}

/// Labels a record carries besides its measurements.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordLabels {
    pub title: String,
    pub name: String,
    pub unit: String,
    pub batch: f64,
    pub complexity_n: f64,
    pub relative: bool,
}

impl RecordLabels {
    pub fn new(title: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            name: name.into(),
            unit: String::from("op"),
            batch: 1.0,
            complexity_n: -1.0,
            relative: false,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

impl ResultRecord {
    /// Build a record from a finished sampler run.
    ///
    /// Fails with [`BenchError::EmptySampleSet`] when the run holds no samples.
    pub fn from_run(
        labels: RecordLabels,
        config: &SamplerConfig,
        run: SampleRun,
    ) -> Result<Self, BenchError> {
        if run.samples.is_empty() {
            return Err(BenchError::empty(labels.name));
        }
        let statistics = Statistics::from_samples(&run.samples);
        Ok(Self {
            title: labels.title,
            name: labels.name,
            unit: labels.unit,
            batch: labels.batch,
            complexity_n: labels.complexity_n,
            epochs: run.samples.len() as u64,
            clock_resolution: run.clock_resolution.as_secs_f64(),
            clock_resolution_multiple: config.clock_resolution_multiple,
            max_epoch_time: config.max_epoch_time.as_secs_f64(),
            min_epoch_time: config.min_epoch_time.as_secs_f64(),
            min_epoch_iterations: config.min_epoch_iterations,
            epoch_iterations: run.epoch_iterations,
            warmup: config.warmup,
            relative: labels.relative,
            statistics,
            total_time: run.total_time.as_secs_f64(),
            measurements: run.samples,
        })
    }

    /// Median elapsed seconds per iteration, the comparator's primary metric.
    pub fn median_elapsed(&self) -> f64 {
        self.statistics.median_elapsed
    }

    pub fn statistic(&self, metric: Metric) -> Option<Statistic> {
        self.statistics.get(metric)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: median={:.6e}s err={:.2}% epochs={} total={:.3}s",
            self.name,
            self.statistics.median_elapsed,
            self.statistics.mape_elapsed * 100.0,
            self.epochs,
            self.total_time
        )
    }
}

/// All records of one run, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultCollection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
}

impl ResultCollection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.results.push(record);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sample::CounterTotals;

    fn run_of(elapsed: &[f64]) -> SampleRun {
        SampleRun {
            samples: elapsed
                .iter()
                .map(|e| Sample::new(1, *e, CounterTotals::default()))
                .collect(),
            total_time: Duration::from_millis(10),
            epoch_iterations: 1,
            clock_resolution: Duration::from_nanos(20),
            rejected_batches: 0,
            converged: false,
        }
    }

    #[test]
    fn test_empty_run_is_rejected() {
        let err = ResultRecord::from_run(
            RecordLabels::new("t", "bench/empty.aria"),
            &SamplerConfig::default(),
            run_of(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::EmptySampleSet(name) if name == "bench/empty.aria"));
    }

    #[test]
    fn test_record_carries_medians_and_config() {
        let record = ResultRecord::from_run(
            RecordLabels::new("t", "a"),
            &SamplerConfig::default(),
            run_of(&[0.3, 0.1, 0.2]),
        )
        .unwrap();
        assert_eq!(record.median_elapsed(), 0.2);
        assert_eq!(record.epochs, 3);
        assert_eq!(record.clock_resolution_multiple, 1000);
        assert_eq!(record.measurements.len(), 3);
        assert!(record.statistic(Metric::Instructions).is_none());
    }

    #[test]
    fn test_counters_present_in_some_samples_get_medians() {
        let mut with = CounterTotals::default();
        with.set(Metric::PageFaults, Some(30));
        let samples = vec![
            Sample::new(3, 0.1, with),
            Sample::new(1, 0.1, CounterTotals::default()),
        ];
        let statistics = Statistics::from_samples(&samples);
        let faults = statistics.get(Metric::PageFaults).unwrap();
        assert_eq!(faults.median, 10.0);
        assert_eq!(faults.mape, 0.0);
        assert!(statistics.get(Metric::CpuCycles).is_none());
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let record: ResultRecord = serde_json::from_str(r#"{"name":"old"}"#).unwrap();
        assert_eq!(record.name, "old");
        assert_eq!(record.median_elapsed(), 0.0);
        assert_eq!(record.epochs, 0);
        assert!(record.measurements.is_empty());
    }

    #[test]
    fn test_relative_accepts_numeric_flag() {
        let numeric: ResultRecord = serde_json::from_str(r#"{"relative":1}"#).unwrap();
        assert!(numeric.relative);
        let zero: ResultRecord = serde_json::from_str(r#"{"relative":0}"#).unwrap();
        assert!(!zero.relative);
        let boolean: ResultRecord = serde_json::from_str(r#"{"relative":true}"#).unwrap();
        assert!(boolean.relative);
    }

    #[test]
    fn test_statistic_names_follow_nanobench_layout() {
        let record = ResultRecord::from_run(
            RecordLabels::new("t", "a"),
            &SamplerConfig::default(),
            run_of(&[0.5]),
        )
        .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["median(elapsed)"], 0.5);
        assert_eq!(value["medianAbsolutePercentError(elapsed)"], 0.0);
        assert_eq!(value["complexityN"], -1.0);
        assert!(value.get("median(cpucycles)").is_none());
    }
}
