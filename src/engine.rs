//! Pipeline composition root
//!
//! Wires the queue, the worker pool, and the services together from
//! explicitly injected collaborators. Nothing in the crate reaches for a
//! process-wide singleton; the process owns exactly one engine and passes
//! its handles around.

use crate::config::EngineConfig;
use crate::queue::{FeedbackQueue, WorkerPool};
use crate::sentiment::{LexiconAnalyzer, SentimentAnalyzer};
use crate::services::{FeedbackService, MetricsService};
use crate::storage::{memory::InMemoryStorage, StorageBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Running feedback pipeline: ingestion gate, queue, workers, aggregator
pub struct SentimentEngine {
    queue: Arc<FeedbackQueue>,
    feedback: Arc<FeedbackService>,
    metrics: Arc<MetricsService>,
    workers: WorkerPool,
}

impl SentimentEngine {
    /// Start the pipeline with injected storage and analyzer
    pub fn start(
        config: EngineConfig,
        storage: Arc<dyn StorageBackend>,
        analyzer: Arc<dyn SentimentAnalyzer>,
    ) -> Self {
        let queue = Arc::new(FeedbackQueue::new());
        let metrics = Arc::new(MetricsService::new(storage.clone(), config.clone()));
        let feedback = Arc::new(FeedbackService::new(queue.clone()));
        let workers = WorkerPool::spawn(
            queue.clone(),
            analyzer,
            storage,
            metrics.clone(),
            &config,
        );

        info!(workers = config.worker_concurrency, "sentiment engine started");
        Self {
            queue,
            feedback,
            metrics,
            workers,
        }
    }

    /// Start the pipeline over the in-memory backend and the default
    /// lexicon analyzer
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::start(
            config,
            Arc::new(InMemoryStorage::new()),
            Arc::new(LexiconAnalyzer::new()),
        )
    }

    /// Ingestion gate handle
    pub fn feedback(&self) -> &FeedbackService {
        &self.feedback
    }

    /// Aggregator handle
    pub fn metrics(&self) -> &MetricsService {
        &self.metrics
    }

    /// Queue handle
    pub fn queue(&self) -> &FeedbackQueue {
        &self.queue
    }

    /// Wait until no job is pending or in flight
    pub async fn wait_until_drained(&self) {
        while !self.queue.is_drained() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Stop the worker pool gracefully; in-flight jobs run to completion
    pub async fn shutdown(self) {
        self.workers.shutdown().await;
        info!("sentiment engine stopped");
    }
}
