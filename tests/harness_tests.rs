use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use filebench::{
    BenchError, FixedAnswer, Format, Harness, HarnessConfig, Sampler, SamplerConfig, Slot,
    counters::HardwareCounters,
};
use tempfile::TempDir;

fn harness(output: &Path) -> Harness {
    Harness::new(HarnessConfig {
        title: "Harness".into(),
        output: output.to_path_buf(),
        color: false,
        ..HarnessConfig::default()
    })
    .unwrap()
}

fn sampler() -> Sampler {
    let config = SamplerConfig {
        epochs: 4,
        epoch_iterations: 2,
        convergence: None,
        hardware_counters: false,
        ..SamplerConfig::default()
    };
    Sampler::with_parts(config, Duration::from_nanos(40), HardwareCounters::disabled()).unwrap()
}

fn targets(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

#[test]
fn test_failing_target_does_not_abort_the_run() {
    let dir = TempDir::new().unwrap();
    let harness = harness(dir.path());
    let mut sampler = sampler();
    let outcome = harness.measure(&mut sampler, &targets(&["ok.aria", "bad.aria"]), |path| {
        let bad = path.ends_with("bad.aria");
        move || {
            if bad {
                Err(BenchError::invocation("bad.aria", "exit status 101"))
            } else {
                Ok(())
            }
        }
    });

    assert_eq!(outcome.collection.len(), 1);
    assert_eq!(outcome.collection.records()[0].epochs, 4);
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].error,
        BenchError::TargetInvocation { ref target, .. } if target == "bad.aria"
    ));
}

#[test]
fn test_first_run_saves_results_and_promotes_on_yes() {
    let dir = TempDir::new().unwrap();
    let harness = harness(dir.path());
    let mut sampler = sampler();
    let outcome = harness.measure(&mut sampler, &targets(&["a.aria"]), |_| || Ok::<(), BenchError>(()));

    let mut out = Vec::new();
    let summary = harness.finish(outcome, &mut FixedAnswer(true), &mut out).unwrap();

    assert!(summary.promoted);
    let report = summary.comparison.unwrap();
    assert!(!report.baseline_present);
    assert!(String::from_utf8(out).unwrap().contains("No baseline"));
    for slot in [Slot::Results, Slot::Baseline] {
        assert!(harness.store().report_path(slot, Format::Json).is_file());
    }
}

#[test]
fn test_second_run_compares_against_promoted_baseline() {
    let dir = TempDir::new().unwrap();
    let harness = harness(dir.path());
    let mut sampler = sampler();

    let first = harness.measure(&mut sampler, &targets(&["a.aria"]), |_| || Ok::<(), BenchError>(()));
    harness.finish(first, &mut FixedAnswer(true), &mut Vec::<u8>::new()).unwrap();

    let second = harness.measure(&mut sampler, &targets(&["a.aria"]), |_| || Ok::<(), BenchError>(()));
    let summary = harness.finish(second, &mut FixedAnswer(false), &mut Vec::<u8>::new()).unwrap();

    let report = summary.comparison.unwrap();
    assert!(report.baseline_present);
    assert_eq!(report.compared, 1);
    assert!(!summary.promoted);
}

#[test]
fn test_declining_keeps_results_but_not_baseline() {
    let dir = TempDir::new().unwrap();
    let harness = harness(dir.path());
    let mut sampler = sampler();
    let outcome = harness.measure(&mut sampler, &targets(&["a.aria"]), |_| || Ok::<(), BenchError>(()));

    let summary = harness.finish(outcome, &mut FixedAnswer(false), &mut Vec::<u8>::new()).unwrap();

    assert!(!summary.promoted);
    assert!(harness.store().load(Slot::Results).unwrap().is_some());
    assert!(harness.store().load(Slot::Baseline).unwrap().is_none());
}

#[test]
fn test_malformed_baseline_skips_comparison_but_saves_results() {
    let dir = TempDir::new().unwrap();
    let harness = harness(dir.path());
    let baseline = harness.store().report_path(Slot::Baseline, Format::Json);
    fs::create_dir_all(baseline.parent().unwrap()).unwrap();
    fs::write(&baseline, "[1, 2").unwrap();

    let mut sampler = sampler();
    let outcome = harness.measure(&mut sampler, &targets(&["a.aria"]), |_| || Ok::<(), BenchError>(()));
    let summary = harness.finish(outcome, &mut FixedAnswer(false), &mut Vec::<u8>::new()).unwrap();

    assert!(summary.comparison.is_none());
    assert_eq!(harness.store().load(Slot::Results).unwrap().unwrap().len(), 1);
}

#[test]
fn test_empty_outcome_never_promotes() {
    let dir = TempDir::new().unwrap();
    let harness = harness(dir.path());
    let mut sampler = sampler();
    let outcome = harness.measure(&mut sampler, &targets(&["bad.aria"]), |_| {
        || Err::<(), BenchError>(BenchError::invocation("bad.aria", "not found"))
    });

    let summary = harness.finish(outcome, &mut FixedAnswer(true), &mut Vec::<u8>::new()).unwrap();

    assert!(!summary.promoted);
    assert!(harness.store().load(Slot::Baseline).unwrap().is_none());
}

#[test]
fn test_discover_requires_directories() {
    let dir = TempDir::new().unwrap();
    let err = harness(dir.path()).discover().unwrap_err();
    assert!(matches!(err, BenchError::InvalidInput(_)));
}
