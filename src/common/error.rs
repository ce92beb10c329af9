//! Error types for trajectory_engine

use thiserror::Error;

/// Main error type for trajectory synthesis and ranking
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// Degenerate input (too few points, bad knots, bad radius, counts out of range)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A collaborator outside the core could not be reached or loaded
    #[error("{resource} unavailable: {reason}")]
    Unavailable {
        resource: String,
        reason: String,
        retryable: bool,
    },
    /// Numerical computation failed (singular spline system, etc.)
    #[error("Numerical error: {0}")]
    Numerical(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrajectoryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        TrajectoryError::InvalidInput(msg.into())
    }

    pub fn unavailable(
        resource: impl Into<String>,
        reason: impl Into<String>,
        retryable: bool,
    ) -> Self {
        TrajectoryError::Unavailable {
            resource: resource.into(),
            reason: reason.into(),
            retryable,
        }
    }

    /// Whether a caller may reasonably retry the same call later.
    ///
    /// Only `Unavailable` errors flagged by their source are retryable; the
    /// engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrajectoryError::Unavailable { retryable: true, .. })
    }
}

/// Result type alias for trajectory operations
pub type TrajectoryResult<T> = Result<T, TrajectoryError>;
