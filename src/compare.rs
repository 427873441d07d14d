//! Baseline comparison of median elapsed time.
//!
//! Records are paired positionally by default, so reordering targets between
//! runs mispairs them; [`Pairing::ByName`] matches on record names instead.
//! Only the relative change of the median is considered, the error fields do
//! not widen or narrow the threshold.

use std::fmt::Write as _;

use ahash::AHashMap;
use colored::Colorize;

use crate::config::{CompareConfig, Pairing};
use crate::result::{ResultCollection, ResultRecord};
use crate::stats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Regression,
    Improvement,
}

/// One pair whose change reached the threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonEntry {
    pub name: String,
    /// Baseline median elapsed, seconds.
    pub baseline: f64,
    /// Current median elapsed, seconds.
    pub current: f64,
    /// Relative change as a fraction, positive when slower.
    pub delta: f64,
    pub direction: Direction,
}

impl ComparisonEntry {
    pub fn delta_percent(&self) -> f64 {
        self.delta * 100.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComparisonReport {
    pub baseline_present: bool,
    pub entries: Vec<ComparisonEntry>,
    /// Names of pairs skipped because the baseline median was not positive.
    pub skipped: Vec<String>,
    /// Number of pairs examined.
    pub compared: usize,
}

impl ComparisonReport {
    pub fn any_difference(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn regressions(&self) -> impl Iterator<Item = &ComparisonEntry> {
        self.entries
            .iter()
            .filter(|e| e.direction == Direction::Regression)
    }

    pub fn improvements(&self) -> impl Iterator<Item = &ComparisonEntry> {
        self.entries
            .iter()
            .filter(|e| e.direction == Direction::Improvement)
    }

    /// Text table of the entries, or an explicit line when nothing moved.
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        if !self.baseline_present {
            out.push_str("No baseline found, skipping comparison.\n");
            return out;
        }
        if self.entries.is_empty() {
            let _ = writeln!(
                out,
                "No variation detected against the baseline ({} benchmarks compared).",
                self.compared
            );
            return out;
        }
        let _ = writeln!(
            out,
            "| {:>12} | {:>12} | {:>9} | {}",
            "baseline", "new", "delta", "benchmark"
        );
        let _ = writeln!(out, "|{:-<14}|{:-<14}|{:-<11}|{:-<12}", "", "", "", "");
        for entry in &self.entries {
            let delta = format!("{:>+8.2}%", entry.delta_percent());
            let delta = if !color {
                delta
            } else {
                match entry.direction {
                    Direction::Regression => delta.red().to_string(),
                    Direction::Improvement => delta.green().to_string(),
                }
            };
            let _ = writeln!(
                out,
                "| {:>12} | {:>12} | {} | {}",
                format_seconds(entry.baseline),
                format_seconds(entry.current),
                delta,
                entry.name
            );
        }
        out
    }
}

/// Compare `current` against `baseline`. A missing baseline yields an empty
/// report.
pub fn compare(
    baseline: Option<&ResultCollection>,
    current: &ResultCollection,
    config: &CompareConfig,
) -> ComparisonReport {
    let Some(baseline) = baseline else {
        return ComparisonReport::default();
    };
    let pairs = match config.pairing {
        Pairing::Positional => pair_by_index(baseline, current),
        Pairing::ByName => pair_by_name(baseline, current),
    };
    let mut report = ComparisonReport {
        baseline_present: true,
        compared: pairs.len(),
        ..ComparisonReport::default()
    };
    for (base, cur) in pairs {
        let before = base.median_elapsed();
        if before <= 0.0 {
            report.skipped.push(cur.name.clone());
            continue;
        }
        let after = cur.median_elapsed();
        let Some(delta) = stats::relative_change(before, after) else {
            continue;
        };
        if delta.abs() < config.threshold {
            continue;
        }
        report.entries.push(ComparisonEntry {
            name: cur.name.clone(),
            baseline: before,
            current: after,
            delta,
            direction: if delta > 0.0 {
                Direction::Regression
            } else {
                Direction::Improvement
            },
        });
    }
    report
}

fn pair_by_index<'a>(
    baseline: &'a ResultCollection,
    current: &'a ResultCollection,
) -> Vec<(&'a ResultRecord, &'a ResultRecord)> {
    baseline.results.iter().zip(current.results.iter()).collect()
}

fn pair_by_name<'a>(
    baseline: &'a ResultCollection,
    current: &'a ResultCollection,
) -> Vec<(&'a ResultRecord, &'a ResultRecord)> {
    let mut by_name: AHashMap<&str, &ResultRecord> = AHashMap::new();
    for record in &baseline.results {
        by_name.entry(record.name.as_str()).or_insert(record);
    }
    current
        .results
        .iter()
        .filter_map(|cur| by_name.get(cur.name.as_str()).map(|base| (*base, cur)))
        .collect()
}

/// Human-readable duration for a value in seconds.
pub fn format_seconds(seconds: f64) -> String {
    let abs = seconds.abs();
    if abs >= 1.0 {
        format!("{seconds:.3} s")
    } else if abs >= 1e-3 {
        format!("{:.3} ms", seconds * 1e3)
    } else if abs >= 1e-6 {
        format!("{:.3} us", seconds * 1e6)
    } else {
        format!("{:.3} ns", seconds * 1e9)
    }
}
