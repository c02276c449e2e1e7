//! Feedback ingestion gate
//!
//! Validates raw submissions and hands the canonical record to the queue.
//! Submission returns as soon as the job is enqueued; ingestion latency
//! never depends on scoring or persistence. Validation failures are
//! client-correctable and never retried.

use crate::error::{FleetPulseError, Result};
use crate::queue::FeedbackQueue;
use crate::types::{FeedbackId, FeedbackRecord, FeedbackSubmission, FeedbackType};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Rating assumed when the submitter leaves it out
const DEFAULT_RATING: u8 = 3;

/// Service responsible for feedback ingestion
pub struct FeedbackService {
    queue: Arc<FeedbackQueue>,
}

impl FeedbackService {
    /// Create the gate over an injected queue
    pub fn new(queue: Arc<FeedbackQueue>) -> Self {
        Self { queue }
    }

    /// Validate a submission and enqueue it for async processing
    ///
    /// Returns the canonical record (without a sentiment score) once the job
    /// is durably queued. Does NOT wait for scoring.
    pub fn submit(&self, submission: FeedbackSubmission) -> Result<FeedbackRecord> {
        let record = Self::validate(submission)?;
        self.queue.enqueue(record.clone())?;
        debug!(id = %record.id, driver = %record.driver_id, "feedback accepted and queued");
        Ok(record)
    }

    /// Apply the validation rules in order; the first failure wins
    fn validate(submission: FeedbackSubmission) -> Result<FeedbackRecord> {
        let driver_id = submission
            .driver_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FleetPulseError::InvalidInput("driverId is required".to_string()))?;

        let text = submission
            .text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FleetPulseError::InvalidInput("text is required".to_string()))?;

        let feedback_type = submission
            .feedback_type
            .as_deref()
            .and_then(FeedbackType::parse)
            .ok_or_else(|| {
                FleetPulseError::InvalidInput(
                    "feedbackType must be one of: driver, trip, app, marshal".to_string(),
                )
            })?;

        let rating = match submission.rating {
            Some(r) if (1..=5).contains(&r) => r as u8,
            Some(_) => {
                return Err(FleetPulseError::InvalidInput(
                    "rating must be between 1 and 5".to_string(),
                ))
            }
            None => DEFAULT_RATING,
        };

        Ok(FeedbackRecord {
            id: FeedbackId::new(),
            driver_id: driver_id.to_string(),
            feedback_type,
            text: text.to_string(),
            rating,
            sentiment_score: None,
            timestamp: Utc::now(),
        })
    }
}
