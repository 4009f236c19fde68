//! Unified error handling for the herald crate
//!
//! This module provides a unified error type that consolidates all
//! domain-specific errors into a single [`Error`] enum, while keeping the
//! domain-specific errors usable on their own.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Nothing in this taxonomy is fatal to the process: delivery failures are
//! classified transient/permanent by the sender, and cycle errors are caught
//! at the scheduler loop boundary.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::scheduler::error::SchedulerError;
pub use crate::sender::SenderError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Storage and I/O errors
    Storage,
    /// Configuration errors
    Config,
    /// Parameter validation errors
    Validation,
    /// Scheduler and dispatch errors
    Scheduler,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the herald crate
#[derive(Error, Debug)]
pub enum Error {
    /// Scheduler and dispatch errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Sender configuration/construction errors
    #[error("Sender error: {0}")]
    Sender(#[from] SenderError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Broadcast parameter validation errors (rejected before the store)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Check if this error is recoverable (worth retrying on a later cycle)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Sender(_) => false,
            Self::Database(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Http(_) => true, // HTTP errors are often transient
            Self::Config(_) => false,
            Self::Validation(_) => false,
            Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Sender(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
