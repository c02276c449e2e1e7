//! FIFO feedback job queue
//!
//! Thread-safe queue feeding the worker pool. Producers enqueue validated
//! feedback records without blocking; a pool of consumers shares the
//! receiver and pulls one job at a time. Job outcomes are explicit
//! (`Completed` / `Failed`) and a bounded history of finished jobs is
//! retained for observability, mirroring the durable backend's
//! remove-on-complete policy.
//!
//! The queue is constructed by the composition root and injected wherever
//! it is needed; there is no process-wide singleton.

pub mod worker;

pub use worker::WorkerPool;

use crate::error::{FleetPulseError, Result};
use crate::types::{FeedbackRecord, JobId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::debug;

/// Completed jobs retained in history
const COMPLETED_RETENTION: usize = 100;

/// Failed jobs retained in history
const FAILED_RETENTION: usize = 50;

/// One unit of queued work: a single feedback awaiting scoring + aggregation
#[derive(Debug, Clone)]
pub struct FeedbackJob {
    /// Job identifier
    pub job_id: JobId,

    /// The validated feedback to process
    pub record: FeedbackRecord,

    /// When the job entered the queue
    pub enqueued_at: DateTime<Utc>,
}

/// Explicit job outcome reported by the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum JobOutcome {
    /// Scoring, persistence, and aggregation all succeeded
    Completed,

    /// Some step failed; the reason is surfaced, never silently dropped
    Failed { reason: String },
}

/// History entry for a finished job
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    /// Job identifier
    pub job_id: JobId,

    /// Driver the job was about
    pub driver_id: String,

    /// How the job finished
    pub outcome: JobOutcome,

    /// When the outcome was recorded
    pub finished_at: DateTime<Utc>,
}

/// Queue counters snapshot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueStats {
    /// Jobs enqueued but not yet picked up
    pub pending: usize,

    /// Jobs currently being processed
    pub in_flight: usize,

    /// Jobs completed since startup
    pub completed: u64,

    /// Jobs failed since startup
    pub failed: u64,
}

struct JobHistory {
    completed: VecDeque<JobRecord>,
    failed: VecDeque<JobRecord>,
}

/// FIFO job queue shared between the ingestion gate and the worker pool
#[derive(Clone)]
pub struct FeedbackQueue {
    sender: mpsc::UnboundedSender<FeedbackJob>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<FeedbackJob>>>,
    history: Arc<RwLock<JobHistory>>,
    pending: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    completed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl FeedbackQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            history: Arc::new(RwLock::new(JobHistory {
                completed: VecDeque::new(),
                failed: VecDeque::new(),
            })),
            pending: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Append a job for the given record
    ///
    /// Never blocks the producer; fails only if the consumer side of the
    /// queue is gone, which callers surface as a transient infra failure.
    pub fn enqueue(&self, record: FeedbackRecord) -> Result<JobId> {
        let job = FeedbackJob {
            job_id: JobId::new(),
            record,
            enqueued_at: Utc::now(),
        };
        let job_id = job.job_id;
        let driver_id = job.record.driver_id.clone();

        self.pending.fetch_add(1, Ordering::SeqCst);
        self.sender.send(job).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            FleetPulseError::Queue("queue consumers are gone".to_string())
        })?;

        debug!(%job_id, driver = %driver_id, "job enqueued");
        Ok(job_id)
    }

    /// Receive the next job, waiting until one is available
    ///
    /// Returns None once all producers are gone and the queue is empty.
    /// Consumers share the receiver; each call hands out one job.
    pub async fn recv(&self) -> Option<FeedbackJob> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        }?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Some(job)
    }

    /// Record how a dequeued job finished
    pub async fn record_outcome(&self, job_id: JobId, driver_id: &str, outcome: JobOutcome) {
        let record = JobRecord {
            job_id,
            driver_id: driver_id.to_string(),
            outcome: outcome.clone(),
            finished_at: Utc::now(),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut history = self.history.write().await;
        match outcome {
            JobOutcome::Completed => {
                self.completed.fetch_add(1, Ordering::SeqCst);
                history.completed.push_back(record);
                if history.completed.len() > COMPLETED_RETENTION {
                    history.completed.pop_front();
                }
            }
            JobOutcome::Failed { .. } => {
                self.failed.fetch_add(1, Ordering::SeqCst);
                history.failed.push_back(record);
                if history.failed.len() > FAILED_RETENTION {
                    history.failed.pop_front();
                }
            }
        }
    }

    /// Current counters
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.pending.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }

    /// True when nothing is pending or in flight
    pub fn is_drained(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0 && self.in_flight.load(Ordering::SeqCst) == 0
    }

    /// Retained history of failed jobs, oldest first
    pub async fn recent_failures(&self) -> Vec<JobRecord> {
        self.history.read().await.failed.iter().cloned().collect()
    }
}

impl Default for FeedbackQueue {
    fn default() -> Self {
        Self::new()
    }
}
