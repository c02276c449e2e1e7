//! Pipeline services: feedback ingestion and metrics aggregation

pub mod feedback;
pub mod metrics;

pub use feedback::FeedbackService;
pub use metrics::{AlertOutcome, MetricsService};
