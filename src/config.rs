//! Engine configuration
//!
//! All knobs are sourced from the environment under the `FLEETPULSE_` prefix
//! and carry defaults, so an unconfigured process runs with the documented
//! behavior:
//!
//! ```text
//! FLEETPULSE_EMA_ALPHA=0.2          smoothing factor, in (0,1]
//! FLEETPULSE_ALERT_THRESHOLD=2.5    EMA below this may fire an alert
//! FLEETPULSE_ALERT_COOLDOWN_MS=3600000
//! FLEETPULSE_CACHE_TTL_MS=60000
//! FLEETPULSE_WORKER_CONCURRENCY=5
//! FLEETPULSE_JOB_TIMEOUT_MS=30000
//! ```

use crate::error::{FleetPulseError, Result};
use serde::{Deserialize, Serialize};

/// Pipeline configuration with environment-sourced overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// EMA smoothing factor, must be in (0,1]
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,

    /// EMA values below this threshold qualify for an alert
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,

    /// Minimum interval between two alerts for the same driver
    #[serde(default = "default_alert_cooldown_ms")]
    pub alert_cooldown_ms: u64,

    /// Lifetime of the analytics snapshot cache
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Number of concurrent workers draining the queue
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    /// Bound on a single job's scoring + persistence time
    #[serde(default = "default_job_timeout_ms")]
    pub job_timeout_ms: u64,
}

fn default_ema_alpha() -> f64 {
    0.2
}

fn default_alert_threshold() -> f64 {
    2.5
}

fn default_alert_cooldown_ms() -> u64 {
    3_600_000
}

fn default_cache_ttl_ms() -> u64 {
    60_000
}

fn default_worker_concurrency() -> usize {
    5
}

fn default_job_timeout_ms() -> u64 {
    30_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ema_alpha: default_ema_alpha(),
            alert_threshold: default_alert_threshold(),
            alert_cooldown_ms: default_alert_cooldown_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            worker_concurrency: default_worker_concurrency(),
            job_timeout_ms: default_job_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `FLEETPULSE_*` environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("FLEETPULSE").try_parsing(true))
            .build()?;

        let parsed: EngineConfig = settings.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject values that would make the pipeline misbehave silently
    pub fn validate(&self) -> Result<()> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(config_error(format!(
                "ema_alpha must be in (0,1], got {}",
                self.ema_alpha
            )));
        }
        if !(1.0..=5.0).contains(&self.alert_threshold) {
            return Err(config_error(format!(
                "alert_threshold must be in [1,5], got {}",
                self.alert_threshold
            )));
        }
        if self.worker_concurrency == 0 {
            return Err(config_error("worker_concurrency must be at least 1".to_string()));
        }
        if self.job_timeout_ms == 0 {
            return Err(config_error("job_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Alert cooldown as a chrono duration
    pub fn alert_cooldown(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.alert_cooldown_ms as i64)
    }

    /// Analytics cache TTL as a chrono duration
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.cache_ttl_ms as i64)
    }

    /// Per-job processing bound as a std duration
    pub fn job_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.job_timeout_ms)
    }
}

fn config_error(message: String) -> FleetPulseError {
    FleetPulseError::Config(config::ConfigError::Message(message))
}
