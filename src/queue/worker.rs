//! Background worker pool
//!
//! A fixed number of workers drain the feedback queue. Each worker executes
//! one job fully before taking the next: score the text, persist the
//! completed record, fold the score into the driver's metrics. The pool size
//! is an admission-control knob bounding in-flight scoring + persistence
//! regardless of queue depth.
//!
//! A failing job is logged with its identity and recorded as `Failed`; it
//! never takes the other workers down. A per-job timeout converts a stuck
//! collaborator call into a failed outcome instead of pinning a worker slot
//! indefinitely.

use super::{FeedbackJob, FeedbackQueue, JobOutcome};
use crate::config::EngineConfig;
use crate::error::{FleetPulseError, Result};
use crate::sentiment::SentimentAnalyzer;
use crate::services::MetricsService;
use crate::storage::StorageBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Handle for the pool of feedback workers
pub struct WorkerPool {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `config.worker_concurrency` workers draining `queue`
    pub fn spawn(
        queue: Arc<FeedbackQueue>,
        analyzer: Arc<dyn SentimentAnalyzer>,
        storage: Arc<dyn StorageBackend>,
        metrics: Arc<MetricsService>,
        config: &EngineConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let job_timeout = config.job_timeout();

        let handles = (0..config.worker_concurrency)
            .map(|worker_id| {
                let queue = queue.clone();
                let analyzer = analyzer.clone();
                let storage = storage.clone();
                let metrics = metrics.clone();
                let shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(run_worker(
                    worker_id,
                    queue,
                    analyzer,
                    storage,
                    metrics,
                    job_timeout,
                    shutdown_rx,
                ))
            })
            .collect();

        info!(workers = config.worker_concurrency, "worker pool started");
        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// True while at least one worker task is alive
    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Stop all workers gracefully
    ///
    /// In-flight jobs run to completion; workers waiting for a job exit
    /// immediately.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
        info!("worker pool stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<FeedbackQueue>,
    analyzer: Arc<dyn SentimentAnalyzer>,
    storage: Arc<dyn StorageBackend>,
    metrics: Arc<MetricsService>,
    job_timeout: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    debug!(worker = worker_id, "worker started");
    loop {
        // Only the wait for a job races shutdown; once a job is taken it is
        // processed and its outcome recorded.
        let job = tokio::select! {
            _ = shutdown_rx.recv() => break,
            job = queue.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let job_id = job.job_id;
        let driver_id = job.record.driver_id.clone();

        let outcome = match tokio::time::timeout(
            job_timeout,
            process_job(job, analyzer.as_ref(), storage.as_ref(), &metrics),
        )
        .await
        {
            Ok(Ok(())) => JobOutcome::Completed,
            Ok(Err(e)) => {
                error!(%job_id, driver = %driver_id, error = %e, "feedback job failed");
                JobOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                let err = FleetPulseError::JobProcessing(format!(
                    "timed out after {}ms",
                    job_timeout.as_millis()
                ));
                error!(%job_id, driver = %driver_id, error = %err, "feedback job timed out");
                JobOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        queue.record_outcome(job_id, &driver_id, outcome).await;
    }
    debug!(worker = worker_id, "worker stopped");
}

/// Process a single feedback job:
/// 1. Analyze sentiment through the injected capability
/// 2. Persist the completed feedback record
/// 3. Fold the score into the driver's EMA metrics
async fn process_job(
    job: FeedbackJob,
    analyzer: &dyn SentimentAnalyzer,
    storage: &dyn StorageBackend,
    metrics: &MetricsService,
) -> Result<()> {
    let mut record = job.record;
    let score = analyzer.analyze(&record.text);
    debug!(driver = %record.driver_id, score, "feedback scored");

    record.sentiment_score = Some(score);
    storage.store_feedback(&record).await?;

    metrics
        .update_driver_metrics(&record.driver_id, score)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::LexiconAnalyzer;
    use crate::storage::memory::InMemoryStorage;
    use crate::types::{FeedbackId, FeedbackRecord, FeedbackType};
    use chrono::Utc;

    fn record(driver_id: &str, text: &str) -> FeedbackRecord {
        FeedbackRecord {
            id: FeedbackId::new(),
            driver_id: driver_id.to_string(),
            feedback_type: FeedbackType::Driver,
            text: text.to_string(),
            rating: 3,
            sentiment_score: None,
            timestamp: Utc::now(),
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            worker_concurrency: 2,
            job_timeout_ms: 1_000,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_pool_processes_jobs_and_stops() {
        let queue = Arc::new(FeedbackQueue::new());
        let storage = Arc::new(InMemoryStorage::new());
        let config = test_config();
        let metrics = Arc::new(MetricsService::new(storage.clone(), config.clone()));
        let pool = WorkerPool::spawn(
            queue.clone(),
            Arc::new(LexiconAnalyzer::new()),
            storage.clone(),
            metrics,
            &config,
        );
        assert_eq!(pool.worker_count(), 2);
        assert!(pool.is_running());

        queue.enqueue(record("D1", "excellent service")).unwrap();
        queue.enqueue(record("D2", "terrible and rude")).unwrap();

        while !queue.is_drained() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(queue.stats().completed, 2);
        assert_eq!(storage.feedback_count().await, 2);
        let d1 = storage.get_driver_metrics("D1").await.unwrap().unwrap();
        assert!((d1.ema_score - 5.0).abs() < 1e-9);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_scored_record_is_persisted_once() {
        let queue = Arc::new(FeedbackQueue::new());
        let storage = Arc::new(InMemoryStorage::new());
        let config = test_config();
        let metrics = Arc::new(MetricsService::new(storage.clone(), config.clone()));
        let pool = WorkerPool::spawn(
            queue.clone(),
            Arc::new(LexiconAnalyzer::new()),
            storage.clone(),
            metrics,
            &config,
        );

        queue.enqueue(record("D1", "good driver but late")).unwrap();
        while !queue.is_drained() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let persisted = storage.feedback_for_driver("D1", 50).await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].sentiment_score, Some(3.2));

        pool.shutdown().await;
    }
}
