//! The measured action and the subprocess implementation used by the driver.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use tracing::trace;
use wait_timeout::ChildExt;

use crate::BenchError;
use crate::config::WorkloadConfig;

/// A zero-argument fallible action executed once per iteration.
///
/// Implemented for every `FnMut() -> Result<(), BenchError>`, so synthetic
/// workloads can be plain closures.
pub trait Workload {
    fn run(&mut self) -> Result<(), BenchError>;
}

impl<F> Workload for F
where
    F: FnMut() -> Result<(), BenchError>,
{
    fn run(&mut self) -> Result<(), BenchError> {
        self()
    }
}

/// Runs `<runtime> <file>` with output discarded.
#[derive(Clone, Debug)]
pub struct ProcessWorkload {
    runtime: PathBuf,
    target: PathBuf,
    timeout: Option<Duration>,
    fail_on_nonzero: bool,
}

impl ProcessWorkload {
    pub fn new(config: &WorkloadConfig, target: impl Into<PathBuf>) -> Self {
        Self {
            runtime: config.runtime.clone(),
            target: target.into(),
            timeout: config.timeout,
            fail_on_nonzero: config.fail_on_nonzero,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    fn label(&self) -> String {
        self.target.display().to_string()
    }

    fn spawn(&self) -> Result<Child, BenchError> {
        Command::new(&self.runtime)
            .arg(&self.target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                BenchError::invocation(
                    self.label(),
                    format!("cannot start {}: {e}", self.runtime.display()),
                )
            })
    }

    /// Block until the child exits. The timeout wakes on child exit rather
    /// than on a polling schedule, so it adds nothing to the measured time.
    fn wait(&self, mut child: Child) -> Result<ExitStatus, BenchError> {
        let Some(timeout) = self.timeout else {
            return child
                .wait()
                .map_err(|e| BenchError::invocation(self.label(), e.to_string()));
        };
        match child.wait_timeout(timeout) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(BenchError::timeout(self.label(), timeout))
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(BenchError::invocation(self.label(), e.to_string()))
            }
        }
    }

    fn check(&self, status: ExitStatus) -> Result<(), BenchError> {
        match status.code() {
            Some(0) => Ok(()),
            Some(code) if self.fail_on_nonzero => Err(BenchError::invocation(
                self.label(),
                format!("exited with status {code}"),
            )),
            Some(code) => {
                trace!(target_file = %self.label(), code, "ignoring non-zero exit status");
                Ok(())
            }
            None => Err(BenchError::invocation(self.label(), "terminated by signal")),
        }
    }
}

impl Workload for ProcessWorkload {
    fn run(&mut self) -> Result<(), BenchError> {
        let child = self.spawn()?;
        let status = self.wait(child)?;
        self.check(status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn config(runtime: &str, timeout: Option<Duration>) -> WorkloadConfig {
        WorkloadConfig {
            runtime: PathBuf::from(runtime),
            timeout,
            fail_on_nonzero: false,
        }
    }

    #[test]
    fn test_missing_runtime_is_invocation_error() {
        let mut workload = ProcessWorkload::new(
            &config("/nonexistent/filebench-runtime", None),
            "bench/a.aria",
        );
        let err = workload.run().unwrap_err();
        match err {
            BenchError::TargetInvocation { target, .. } => assert_eq!(target, "bench/a.aria"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_nonzero_exit_is_ignored_by_default() {
        let mut workload = ProcessWorkload::new(&config("false", None), "ignored");
        assert!(workload.run().is_ok());
    }

    #[test]
    fn test_nonzero_exit_fails_when_requested() {
        let mut cfg = config("false", Some(Duration::from_secs(10)));
        cfg.fail_on_nonzero = true;
        let mut workload = ProcessWorkload::new(&cfg, "ignored");
        assert!(matches!(
            workload.run(),
            Err(BenchError::TargetInvocation { .. })
        ));
    }

    #[test]
    fn test_hung_target_times_out() {
        let mut workload =
            ProcessWorkload::new(&config("sleep", Some(Duration::from_millis(50))), "5");
        assert!(matches!(
            workload.run(),
            Err(BenchError::TargetTimeout { .. })
        ));
    }

    #[test]
    fn test_timeout_does_not_inflate_measured_time() {
        use std::time::Instant;

        fn time_one(workload: &mut ProcessWorkload) -> f64 {
            let start = Instant::now();
            workload.run().unwrap();
            start.elapsed().as_secs_f64()
        }

        let mut blocking = ProcessWorkload::new(&config("sleep", None), "0.0013");
        let mut bounded =
            ProcessWorkload::new(&config("sleep", Some(Duration::from_secs(60))), "0.0013");
        let mut blocking_times = Vec::new();
        let mut bounded_times = Vec::new();
        for _ in 0..21 {
            blocking_times.push(time_one(&mut blocking));
            bounded_times.push(time_one(&mut bounded));
        }
        let blocking = crate::stats::median(&blocking_times).unwrap();
        let bounded = crate::stats::median(&bounded_times).unwrap();
        let change = (bounded - blocking) / blocking;
        assert!(
            change.abs() < 0.15,
            "blocking {blocking:.6}s vs bounded {bounded:.6}s"
        );
    }

    #[test]
    fn test_closure_is_a_workload() {
        let mut calls = 0;
        let mut workload = || {
            calls += 1;
            Ok::<(), BenchError>(())
        };
        workload.run().unwrap();
        workload.run().unwrap();
        assert_eq!(calls, 2);
    }
}
