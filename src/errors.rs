use std::time::Duration;

use thiserror::Error;

/// Error type for filebench operations.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to invoke target {target}: {reason}")]
    TargetInvocation { target: String, reason: String },
    #[error("target {target} did not finish within {timeout:?}")]
    TargetTimeout { target: String, timeout: Duration },
    #[error("no samples collected for {0}")]
    EmptySampleSet(String),
    #[error("malformed result data in {path}: {reason}")]
    MalformedData { path: String, reason: String },
    #[error("storage error at {path}: {reason}")]
    Storage { path: String, reason: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("hardware counter error: {0}")]
    Counter(String),
}

impl BenchError {
    pub fn invocation<T: Into<String>, R: Into<String>>(target: T, reason: R) -> Self {
        BenchError::TargetInvocation {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout<T: Into<String>>(target: T, timeout: Duration) -> Self {
        BenchError::TargetTimeout {
            target: target.into(),
            timeout,
        }
    }

    pub fn empty<T: Into<String>>(target: T) -> Self {
        BenchError::EmptySampleSet(target.into())
    }

    pub fn malformed<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        BenchError::MalformedData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn storage<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        BenchError::Storage {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        BenchError::InvalidInput(msg.into())
    }

    pub fn counter<T: Into<String>>(msg: T) -> Self {
        BenchError::Counter(msg.into())
    }

    /// Whether the error belongs to a single target rather than the whole run.
    pub fn is_target_scoped(&self) -> bool {
        matches!(
            self,
            BenchError::TargetInvocation { .. }
                | BenchError::TargetTimeout { .. }
                | BenchError::EmptySampleSet(_)
        )
    }
}
