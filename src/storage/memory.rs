//! In-memory storage backend
//!
//! Reference implementation of [`StorageBackend`] over tokio-guarded maps.
//! Used by the test suites and the CLI binary; not durable.

use super::StorageBackend;
use crate::error::Result;
use crate::types::{Alert, DriverMetrics, FeedbackRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local storage for feedback, metrics, and alerts
#[derive(Default)]
pub struct InMemoryStorage {
    feedback: RwLock<Vec<FeedbackRecord>>,
    metrics: RwLock<HashMap<String, DriverMetrics>>,
    alerts: RwLock<Vec<Alert>>,
}

impl InMemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of persisted feedback records
    pub async fn feedback_count(&self) -> usize {
        self.feedback.read().await.len()
    }

    /// Total number of persisted alerts
    pub async fn alert_count(&self) -> usize {
        self.alerts.read().await.len()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn store_feedback(&self, feedback: &FeedbackRecord) -> Result<()> {
        self.feedback.write().await.push(feedback.clone());
        Ok(())
    }

    async fn feedback_for_driver(
        &self,
        driver_id: &str,
        limit: usize,
    ) -> Result<Vec<FeedbackRecord>> {
        let feedback = self.feedback.read().await;
        let mut matching: Vec<FeedbackRecord> = feedback
            .iter()
            .filter(|f| f.driver_id == driver_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn get_driver_metrics(&self, driver_id: &str) -> Result<Option<DriverMetrics>> {
        Ok(self.metrics.read().await.get(driver_id).cloned())
    }

    async fn upsert_driver_metrics(&self, metrics: &DriverMetrics) -> Result<()> {
        self.metrics
            .write()
            .await
            .insert(metrics.driver_id.clone(), metrics.clone());
        Ok(())
    }

    async fn list_driver_metrics(&self) -> Result<Vec<DriverMetrics>> {
        let metrics = self.metrics.read().await;
        let mut all: Vec<DriverMetrics> = metrics.values().cloned().collect();
        all.sort_by(|a, b| a.driver_id.cmp(&b.driver_id));
        Ok(all)
    }

    async fn store_alert(&self, alert: &Alert) -> Result<()> {
        self.alerts.write().await.push(alert.clone());
        Ok(())
    }

    async fn alerts_for_driver(&self, driver_id: &str, limit: usize) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        let mut matching: Vec<Alert> = alerts
            .iter()
            .filter(|a| a.driver_id == driver_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        let mut all: Vec<Alert> = alerts.iter().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all.truncate(limit);
        Ok(all)
    }
}
