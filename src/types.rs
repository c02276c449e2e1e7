//! Core data types for the FleetPulse sentiment engine
//!
//! This module defines the fundamental data structures flowing through the
//! pipeline: raw submissions, canonical feedback records, per-driver metrics,
//! alerts, and the analytics payloads served at the boundary. Wire names are
//! camelCase to match the collaborator contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for feedback records
///
/// Wraps a UUID to provide type safety and prevent mixing feedback IDs
/// with other UUID-based identifiers in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(pub Uuid);

impl FeedbackId {
    /// Create a new random feedback ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a feedback ID from a string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for FeedbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for queued jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Create a new random job ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feedback category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    /// About the driver's conduct
    Driver,

    /// About a specific trip
    Trip,

    /// About the rider application
    App,

    /// About the marshal on duty
    Marshal,
}

impl FeedbackType {
    /// All accepted categories, in the order they are advertised to clients
    pub const ALL: [FeedbackType; 4] = [
        FeedbackType::Driver,
        FeedbackType::Trip,
        FeedbackType::App,
        FeedbackType::Marshal,
    ];

    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Driver => "driver",
            FeedbackType::Trip => "trip",
            FeedbackType::App => "app",
            FeedbackType::Marshal => "marshal",
        }
    }

    /// Parse a wire name into a category
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "driver" => Some(FeedbackType::Driver),
            "trip" => Some(FeedbackType::Trip),
            "app" => Some(FeedbackType::App),
            "marshal" => Some(FeedbackType::Marshal),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw, untrusted feedback payload as received at the boundary
///
/// Every field is optional; the ingestion gate decides what is missing or
/// malformed and rejects with a specific reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    /// Driver the feedback is about
    pub driver_id: Option<String>,

    /// Feedback category wire name
    pub feedback_type: Option<String>,

    /// Free-text feedback body
    pub text: Option<String>,

    /// Star rating 1-5; defaults to 3 when absent
    pub rating: Option<i64>,
}

/// A single piece of validated feedback
///
/// Created by the ingestion gate without a sentiment score; the worker pool
/// attaches the score and persists the record once. Immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Unique identifier
    pub id: FeedbackId,

    /// Driver the feedback is about
    pub driver_id: String,

    /// Feedback category
    pub feedback_type: FeedbackType,

    /// Free-text feedback body, trimmed
    pub text: String,

    /// Star rating 1-5
    pub rating: u8,

    /// Lexicon sentiment score in [1,5]; None until the worker scores it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,

    /// Server-assigned submission timestamp
    pub timestamp: DateTime<Utc>,
}

/// Continuously-updated reputation signal for one driver
///
/// One record per driver, created on first feedback, mutated on every
/// subsequent feedback, never deleted. `ema_score` is the exponential moving
/// average of all sentiment scores seen so far and stays within the scorer's
/// [1,5] output range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverMetrics {
    /// Driver identifier (unique key)
    pub driver_id: String,

    /// Exponential moving average of sentiment scores
    pub ema_score: f64,

    /// Number of feedbacks folded into the EMA
    pub total_feedback_count: u64,

    /// When the last alert fired for this driver, if any
    pub last_alert_timestamp: Option<DateTime<Utc>>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Append-only anomaly alert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Driver the alert is about
    pub driver_id: String,

    /// EMA snapshot at fire time, rounded to two decimals
    pub ema_score: f64,

    /// Human-readable description embedding driver, EMA, and threshold
    pub message: String,

    /// When the alert fired
    pub timestamp: DateTime<Utc>,
}

/// Fan-out read for a single driver
///
/// `metrics` is None for an unknown driver; the boundary layer maps that to
/// a not-found response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDetail {
    /// Aggregated metrics, if the driver has any feedback
    pub metrics: Option<DriverMetrics>,

    /// Recent feedbacks, newest first (at most 50)
    pub feedbacks: Vec<FeedbackRecord>,

    /// Recent alerts, newest first (at most 20)
    pub alerts: Vec<Alert>,
}

/// Aggregate analytics payload served at the boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// All driver metrics, ordered by driver ID ascending
    pub metrics: Vec<DriverMetrics>,

    /// Recent alerts, newest first
    pub alerts: Vec<Alert>,

    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
}
