//! Persistence collaborator seam
//!
//! Durable storage is external to the pipeline; the core depends only on
//! [`StorageBackend`]. [`memory::InMemoryStorage`] is the reference
//! implementation used by tests and the CLI binary; a database-backed
//! implementation plugs in behind the same trait.

pub mod memory;

use crate::error::Result;
use crate::types::{Alert, DriverMetrics, FeedbackRecord};
use async_trait::async_trait;

/// Storage backend trait defining all operations the pipeline requires
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Append a completed feedback record (persisted exactly once)
    async fn store_feedback(&self, feedback: &FeedbackRecord) -> Result<()>;

    /// Feedbacks for one driver, newest first, at most `limit`
    async fn feedback_for_driver(&self, driver_id: &str, limit: usize)
        -> Result<Vec<FeedbackRecord>>;

    /// Look up a driver's metrics record
    async fn get_driver_metrics(&self, driver_id: &str) -> Result<Option<DriverMetrics>>;

    /// Insert or replace a driver's metrics record
    async fn upsert_driver_metrics(&self, metrics: &DriverMetrics) -> Result<()>;

    /// All driver metrics, ordered by driver ID ascending
    async fn list_driver_metrics(&self) -> Result<Vec<DriverMetrics>>;

    /// Append an alert
    async fn store_alert(&self, alert: &Alert) -> Result<()>;

    /// Alerts for one driver, newest first, at most `limit`
    async fn alerts_for_driver(&self, driver_id: &str, limit: usize) -> Result<Vec<Alert>>;

    /// Alerts across all drivers, newest first, at most `limit`
    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>>;
}
