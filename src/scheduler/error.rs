//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
///
/// Individual delivery and bookkeeping failures are isolated inside a cycle
/// and counted in the cycle stats; only failures that abort the cycle as a
/// whole surface here.
#[derive(Debug)]
pub enum SchedulerError {
    /// Fetching the candidate set from the store failed
    CandidateQueryFailed {
        reason: String,
    },

    /// Invalid tick period
    InvalidTickPeriod {
        seconds: u64,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CandidateQueryFailed { reason } => {
                write!(f, "Failed to query dispatch candidates: {}", reason)
            }
            Self::InvalidTickPeriod { seconds } => {
                write!(f, "Invalid tick period '{}s'. Must be at least 1", seconds)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Cycle-level errors are retried on the next tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::CandidateQueryFailed { .. } => true,
            Self::InvalidTickPeriod { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SchedulerError::CandidateQueryFailed {
            reason: "db locked".to_string(),
        };
        assert!(err.to_string().contains("db locked"));

        let err = SchedulerError::InvalidTickPeriod { seconds: 0 };
        assert!(err.to_string().contains("0s"));
    }

    #[test]
    fn test_recoverability() {
        assert!(SchedulerError::CandidateQueryFailed {
            reason: "x".into()
        }
        .is_recoverable());
        assert!(!SchedulerError::InvalidTickPeriod { seconds: 0 }.is_recoverable());
    }
}
