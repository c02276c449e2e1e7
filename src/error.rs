//! Error types for the FleetPulse sentiment engine
//!
//! This module provides comprehensive error handling using thiserror for
//! structured error definitions and anyhow for error propagation.

use thiserror::Error;

/// Main error type for FleetPulse operations
#[derive(Error, Debug)]
pub enum FleetPulseError {
    /// Client-correctable validation failure, returned synchronously from
    /// the ingestion gate and never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Queue backend unavailable or rejected the job
    #[error("Queue error: {0}")]
    Queue(String),

    /// Persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Scorer or aggregator failed while processing a dequeued job
    #[error("Job processing failed: {0}")]
    JobProcessing(String),

    /// Invalid feedback ID format
    #[error("Invalid feedback ID: {0}")]
    InvalidFeedbackId(#[from] uuid::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for FleetPulse operations
pub type Result<T> = std::result::Result<T, FleetPulseError>;

/// Convert anyhow::Error to FleetPulseError
impl From<anyhow::Error> for FleetPulseError {
    fn from(err: anyhow::Error) -> Self {
        FleetPulseError::Other(err.to_string())
    }
}
