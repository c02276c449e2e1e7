//! FleetPulse - Driver Sentiment Engine
//!
//! An asynchronous pipeline that ingests free-text feedback about drivers,
//! scores its sentiment, and maintains a continuously-updated reputation
//! signal per driver with automatic anomaly alerting:
//! - Ingestion gate validating submissions and enqueueing them
//! - Bounded worker pool draining the queue
//! - Deterministic lexicon-based sentiment scorer
//! - EMA metrics aggregation with alert throttling and a TTL-cached
//!   analytics view
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core data structures (FeedbackRecord, DriverMetrics, Alert)
//! - **Sentiment**: The scoring capability and its lexicon implementation
//! - **Queue**: FIFO job queue and the worker pool
//! - **Services**: Ingestion gate and metrics aggregator
//! - **Storage**: Persistence collaborator seam with an in-memory backend
//!
//! # Example
//!
//! ```ignore
//! use fleetpulse_core::{EngineConfig, FeedbackSubmission, SentimentEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = SentimentEngine::in_memory(EngineConfig::from_env()?);
//!
//!     engine.feedback().submit(FeedbackSubmission {
//!         driver_id: Some("D1".into()),
//!         feedback_type: Some("driver".into()),
//!         text: Some("smooth and punctual".into()),
//!         rating: Some(5),
//!     })?;
//!
//!     engine.wait_until_drained().await;
//!     let report = engine.metrics().analytics_report().await?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod queue;
pub mod sentiment;
pub mod services;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::SentimentEngine;
pub use error::{FleetPulseError, Result};
pub use queue::{FeedbackQueue, JobOutcome, WorkerPool};
pub use sentiment::{LexiconAnalyzer, SentimentAnalyzer};
pub use services::{FeedbackService, MetricsService};
pub use storage::{memory::InMemoryStorage, StorageBackend};
pub use types::{
    Alert, AnalyticsReport, DriverDetail, DriverMetrics, FeedbackId, FeedbackRecord,
    FeedbackSubmission, FeedbackType, JobId,
};
