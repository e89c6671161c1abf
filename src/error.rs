//! Structured errors shared by every module of the crate.

use std::fmt;

#[derive(Debug)]
/// Errors returned by shapes, arrays, enumeration spaces and the set-cover workload.
pub enum ComputeError {
    /// A size or exact integer result does not fit the target integer width.
    Overflow { stage: &'static str, detail: String },
    /// A global index (or coordinate tuple) lies outside the shape it addresses.
    Index {
        stage: &'static str,
        gid: u64,
        size: u64,
    },
    /// The space variant does not implement the requested operation.
    Unsupported {
        operation: &'static str,
        variant: &'static str,
    },
    /// Stream or file failure, including truncated and malformed binary input.
    Io {
        stage: &'static str,
        path: Option<String>,
        error: String,
    },
    /// A `try_reserve` allocation failed for a large buffer.
    AllocationFailed {
        stage: &'static str,
        structure: &'static str,
        requested: u64,
    },
    /// A run configuration or parameter set is inconsistent.
    InvalidConfig { reason: String },
}

impl ComputeError {
    pub(crate) fn io(stage: &'static str, error: impl fmt::Display) -> Self {
        ComputeError::Io {
            stage,
            path: None,
            error: error.to_string(),
        }
    }

    pub(crate) fn io_at(
        stage: &'static str,
        path: &std::path::Path,
        error: impl fmt::Display,
    ) -> Self {
        ComputeError::Io {
            stage,
            path: Some(path.display().to_string()),
            error: error.to_string(),
        }
    }

    pub(crate) fn overflow(stage: &'static str, detail: impl Into<String>) -> Self {
        ComputeError::Overflow {
            stage,
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ComputeError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeError::Overflow { stage, detail } => {
                write!(f, "overflow at {stage}: {detail}")
            }
            ComputeError::Index { stage, gid, size } => {
                write!(f, "index out of bounds at {stage}: gid={gid}, size={size}")
            }
            ComputeError::Unsupported { operation, variant } => {
                write!(f, "unsupported operation {operation} on {variant} space")
            }
            ComputeError::Io {
                stage,
                path: Some(path),
                error,
            } => write!(f, "io error at {stage} for {path}: {error}"),
            ComputeError::Io {
                stage,
                path: None,
                error,
            } => write!(f, "io error at {stage}: {error}"),
            ComputeError::AllocationFailed {
                stage,
                structure,
                requested,
            } => write!(
                f,
                "allocation failed at {stage} for {structure} ({requested} elements)"
            ),
            ComputeError::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ComputeError {}
