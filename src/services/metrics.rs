//! Driver metrics aggregation
//!
//! Owns all DriverMetrics and Alert writes. Each feedback score is folded
//! into the driver's Exponential Moving Average in O(1) time and space:
//! only the current EMA and count are stored.
//!
//! Concurrency: the queue gives no per-driver ordering, so two feedbacks for
//! the same driver can race on the read-modify-persist of one metrics row.
//! A per-driver async mutex serializes the whole update (EMA fold, persist,
//! alert evaluation) — without it a concurrent update could be silently
//! lost. The analytics snapshot cache has its own lock and is invalidated on
//! every successful update.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::{Alert, AnalyticsReport, DriverDetail, DriverMetrics};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Alerts returned by the analytics and detail reads
const ALERT_LIMIT: usize = 20;

/// Feedbacks returned by the driver detail read
const RECENT_FEEDBACK_LIMIT: usize = 50;

/// Result of one alert evaluation
#[derive(Debug, Clone)]
pub enum AlertOutcome {
    /// EMA is at or above the threshold
    NotTriggered,

    /// EMA qualifies but the cooldown window is still open; an observable
    /// no-op, not an error
    Suppressed {
        /// Time left until the driver may alert again
        remaining: chrono::Duration,
    },

    /// A new alert was persisted
    Fired(Alert),
}

struct AnalyticsSnapshot {
    metrics: Vec<DriverMetrics>,
    captured_at: DateTime<Utc>,
}

/// Service managing driver metrics, alert throttling, and the analytics cache
pub struct MetricsService {
    storage: Arc<dyn StorageBackend>,
    config: EngineConfig,
    /// Per-driver critical sections for the read-modify-persist sequence
    driver_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Read-through cache for the analytics listing
    analytics_cache: RwLock<Option<AnalyticsSnapshot>>,
}

impl MetricsService {
    /// Create the aggregator over an injected storage collaborator
    pub fn new(storage: Arc<dyn StorageBackend>, config: EngineConfig) -> Self {
        Self {
            storage,
            config,
            driver_locks: Mutex::new(HashMap::new()),
            analytics_cache: RwLock::new(None),
        }
    }

    /// Fold a new sentiment score into the driver's metrics
    ///
    /// First observation seeds the EMA exactly; afterwards
    /// `ema_new = score * alpha + ema_old * (1 - alpha)`. Persists the
    /// record, evaluates alerting with the new EMA, and invalidates the
    /// analytics cache. Returns the updated record.
    pub async fn update_driver_metrics(
        &self,
        driver_id: &str,
        score: f64,
    ) -> Result<DriverMetrics> {
        let lock = self.driver_lock(driver_id).await;
        let _guard = lock.lock().await;

        let now = Utc::now();
        let mut metrics = match self.storage.get_driver_metrics(driver_id).await? {
            Some(mut existing) => {
                let alpha = self.config.ema_alpha;
                existing.ema_score = score * alpha + existing.ema_score * (1.0 - alpha);
                existing.total_feedback_count += 1;
                existing.updated_at = now;
                existing
            }
            None => DriverMetrics {
                driver_id: driver_id.to_string(),
                ema_score: score,
                total_feedback_count: 1,
                last_alert_timestamp: None,
                updated_at: now,
            },
        };

        self.storage.upsert_driver_metrics(&metrics).await?;
        self.check_and_alert(&mut metrics).await?;
        self.invalidate_cache().await;

        debug!(
            driver = driver_id,
            ema = metrics.ema_score,
            count = metrics.total_feedback_count,
            "driver metrics updated"
        );
        Ok(metrics)
    }

    /// Evaluate alerting against the driver's new EMA
    ///
    /// Fires only when the EMA is below the threshold AND the cooldown since
    /// the last alert has elapsed. Runs inside the caller's per-driver
    /// critical section, so the alert write and the metrics write land as
    /// one consistent state.
    async fn check_and_alert(&self, metrics: &mut DriverMetrics) -> Result<AlertOutcome> {
        if metrics.ema_score >= self.config.alert_threshold {
            return Ok(AlertOutcome::NotTriggered);
        }

        let now = Utc::now();
        if let Some(last) = metrics.last_alert_timestamp {
            let elapsed = now - last;
            let cooldown = self.config.alert_cooldown();
            if elapsed < cooldown {
                let remaining = cooldown - elapsed;
                debug!(
                    driver = %metrics.driver_id,
                    remaining_ms = remaining.num_milliseconds(),
                    "alert suppressed by cooldown"
                );
                return Ok(AlertOutcome::Suppressed { remaining });
            }
        }

        let alert = Alert {
            driver_id: metrics.driver_id.clone(),
            ema_score: (metrics.ema_score * 100.0).round() / 100.0,
            message: format!(
                "Driver {} EMA dropped to {:.2} (threshold: {})",
                metrics.driver_id, metrics.ema_score, self.config.alert_threshold
            ),
            timestamp: now,
        };
        self.storage.store_alert(&alert).await?;

        metrics.last_alert_timestamp = Some(now);
        self.storage.upsert_driver_metrics(metrics).await?;

        warn!(driver = %metrics.driver_id, ema = metrics.ema_score, "alert fired");
        Ok(AlertOutcome::Fired(alert))
    }

    /// All driver metrics, ordered by driver ID, through the snapshot cache
    ///
    /// Serves the cached snapshot while it is younger than the TTL;
    /// otherwise refetches and re-caches. Updates never refresh the cache
    /// incrementally — they only invalidate it.
    pub async fn get_analytics(&self) -> Result<Vec<DriverMetrics>> {
        let ttl = self.config.cache_ttl();

        {
            let cache = self.analytics_cache.read().await;
            if let Some(snapshot) = cache.as_ref() {
                if Utc::now() - snapshot.captured_at < ttl {
                    debug!("serving analytics from cache");
                    return Ok(snapshot.metrics.clone());
                }
            }
        }

        let mut cache = self.analytics_cache.write().await;
        // another reader may have refreshed while we waited for the lock
        if let Some(snapshot) = cache.as_ref() {
            if Utc::now() - snapshot.captured_at < ttl {
                return Ok(snapshot.metrics.clone());
            }
        }

        let metrics = self.storage.list_driver_metrics().await?;
        *cache = Some(AnalyticsSnapshot {
            metrics: metrics.clone(),
            captured_at: Utc::now(),
        });
        debug!(drivers = metrics.len(), "analytics cache refreshed");
        Ok(metrics)
    }

    /// Recent alerts across all drivers, newest first
    pub async fn get_alerts(&self, limit: usize) -> Result<Vec<Alert>> {
        self.storage.recent_alerts(limit).await
    }

    /// Aggregate analytics payload: cached metrics + recent alerts
    pub async fn analytics_report(&self) -> Result<AnalyticsReport> {
        let metrics = self.get_analytics().await?;
        let alerts = self.get_alerts(ALERT_LIMIT).await?;
        Ok(AnalyticsReport {
            metrics,
            alerts,
            generated_at: Utc::now(),
        })
    }

    /// Detailed view of a single driver: metrics, recent feedbacks, alerts
    ///
    /// Fan-out read without caching. An unknown driver yields `metrics: None`
    /// and empty sequences.
    pub async fn get_driver_detail(&self, driver_id: &str) -> Result<DriverDetail> {
        let (metrics, feedbacks, alerts) = tokio::join!(
            self.storage.get_driver_metrics(driver_id),
            self.storage
                .feedback_for_driver(driver_id, RECENT_FEEDBACK_LIMIT),
            self.storage.alerts_for_driver(driver_id, ALERT_LIMIT),
        );
        Ok(DriverDetail {
            metrics: metrics?,
            feedbacks: feedbacks?,
            alerts: alerts?,
        })
    }

    async fn driver_lock(&self, driver_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.driver_locks.lock().await;
        locks
            .entry(driver_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn invalidate_cache(&self) {
        *self.analytics_cache.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn service_with(config: EngineConfig) -> (Arc<InMemoryStorage>, MetricsService) {
        let storage = Arc::new(InMemoryStorage::new());
        let service = MetricsService::new(storage.clone(), config);
        (storage, service)
    }

    fn service() -> (Arc<InMemoryStorage>, MetricsService) {
        service_with(EngineConfig::default())
    }

    #[tokio::test]
    async fn test_first_score_seeds_ema() {
        let (_, service) = service();
        let metrics = service.update_driver_metrics("D1", 4.2).await.unwrap();
        assert_eq!(metrics.ema_score, 4.2);
        assert_eq!(metrics.total_feedback_count, 1);
        assert!(metrics.last_alert_timestamp.is_none());
    }

    #[tokio::test]
    async fn test_ema_recurrence() {
        let (_, service) = service();
        service.update_driver_metrics("D1", 4.0).await.unwrap();
        let metrics = service.update_driver_metrics("D1", 3.0).await.unwrap();
        // 3.0*0.2 + 4.0*0.8 = 3.8
        assert!((metrics.ema_score - 3.8).abs() < 1e-9);
        assert_eq!(metrics.total_feedback_count, 2);
    }

    #[tokio::test]
    async fn test_low_ema_fires_alert_once_within_cooldown() {
        let (storage, service) = service();
        service.update_driver_metrics("D1", 1.5).await.unwrap();
        assert_eq!(storage.alert_count().await, 1);

        // second qualifying score inside the cooldown window: suppressed
        let metrics = service.update_driver_metrics("D1", 1.5).await.unwrap();
        assert!(metrics.ema_score < 2.5);
        assert_eq!(storage.alert_count().await, 1);

        let alerts = storage.recent_alerts(20).await.unwrap();
        assert_eq!(alerts[0].driver_id, "D1");
        assert!(alerts[0].message.contains("D1"));
        assert!(alerts[0].message.contains("threshold"));
    }

    #[tokio::test]
    async fn test_alert_fires_again_after_cooldown_expiry() {
        let config = EngineConfig {
            alert_cooldown_ms: 50,
            ..EngineConfig::default()
        };
        let (storage, service) = service_with(config);

        service.update_driver_metrics("D1", 1.0).await.unwrap();
        service.update_driver_metrics("D1", 1.0).await.unwrap();
        assert_eq!(storage.alert_count().await, 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        service.update_driver_metrics("D1", 1.0).await.unwrap();
        assert_eq!(storage.alert_count().await, 2);
    }

    #[tokio::test]
    async fn test_alert_outcomes_are_explicit() {
        let (_, service) = service();
        let mut metrics = DriverMetrics {
            driver_id: "D1".to_string(),
            ema_score: 3.0,
            total_feedback_count: 1,
            last_alert_timestamp: None,
            updated_at: Utc::now(),
        };

        let outcome = service.check_and_alert(&mut metrics).await.unwrap();
        assert!(matches!(outcome, AlertOutcome::NotTriggered));

        metrics.ema_score = 2.0;
        let outcome = service.check_and_alert(&mut metrics).await.unwrap();
        assert!(matches!(outcome, AlertOutcome::Fired(ref alert) if alert.driver_id == "D1"));
        assert!(metrics.last_alert_timestamp.is_some());

        // still inside the cooldown: an observable no-op
        let outcome = service.check_and_alert(&mut metrics).await.unwrap();
        match outcome {
            AlertOutcome::Suppressed { remaining } => {
                assert!(remaining > chrono::Duration::zero())
            }
            other => panic!("expected Suppressed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_healthy_ema_never_alerts() {
        let (storage, service) = service();
        for _ in 0..5 {
            service.update_driver_metrics("D1", 4.5).await.unwrap();
        }
        assert_eq!(storage.alert_count().await, 0);
    }

    #[tokio::test]
    async fn test_alert_snapshot_rounded_to_two_decimals() {
        let config = EngineConfig {
            alert_cooldown_ms: 10,
            ..EngineConfig::default()
        };
        let (storage, service) = service_with(config);

        service.update_driver_metrics("D1", 2.0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        service.update_driver_metrics("D1", 1.3).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        // 1.1*0.2 + 1.86*0.8 = 1.708 -> snapshot rounds to 1.71
        let metrics = service.update_driver_metrics("D1", 1.1).await.unwrap();
        assert!((metrics.ema_score - 1.708).abs() < 1e-9);

        let alerts = storage.recent_alerts(20).await.unwrap();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].ema_score, 1.71);
    }

    /// Storage wrapper counting metric listings, to observe cache hits
    struct CountingStorage {
        inner: InMemoryStorage,
        listings: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StorageBackend for CountingStorage {
        async fn store_feedback(&self, f: &crate::types::FeedbackRecord) -> Result<()> {
            self.inner.store_feedback(f).await
        }
        async fn feedback_for_driver(
            &self,
            d: &str,
            l: usize,
        ) -> Result<Vec<crate::types::FeedbackRecord>> {
            self.inner.feedback_for_driver(d, l).await
        }
        async fn get_driver_metrics(&self, d: &str) -> Result<Option<DriverMetrics>> {
            self.inner.get_driver_metrics(d).await
        }
        async fn upsert_driver_metrics(&self, m: &DriverMetrics) -> Result<()> {
            self.inner.upsert_driver_metrics(m).await
        }
        async fn list_driver_metrics(&self) -> Result<Vec<DriverMetrics>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            self.inner.list_driver_metrics().await
        }
        async fn store_alert(&self, a: &Alert) -> Result<()> {
            self.inner.store_alert(a).await
        }
        async fn alerts_for_driver(&self, d: &str, l: usize) -> Result<Vec<Alert>> {
            self.inner.alerts_for_driver(d, l).await
        }
        async fn recent_alerts(&self, l: usize) -> Result<Vec<Alert>> {
            self.inner.recent_alerts(l).await
        }
    }

    #[tokio::test]
    async fn test_analytics_cached_within_ttl() {
        let storage = Arc::new(CountingStorage {
            inner: InMemoryStorage::new(),
            listings: AtomicUsize::new(0),
        });
        let service = MetricsService::new(storage.clone(), EngineConfig::default());

        service.update_driver_metrics("D1", 4.0).await.unwrap();

        let first = service.get_analytics().await.unwrap();
        let second = service.get_analytics().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].ema_score, second[0].ema_score);
        // second read was served from the cache
        assert_eq!(storage.listings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_analytics_cache() {
        let storage = Arc::new(CountingStorage {
            inner: InMemoryStorage::new(),
            listings: AtomicUsize::new(0),
        });
        let service = MetricsService::new(storage.clone(), EngineConfig::default());

        service.update_driver_metrics("D1", 4.0).await.unwrap();
        let before = service.get_analytics().await.unwrap();
        assert_eq!(before[0].ema_score, 4.0);

        service.update_driver_metrics("D1", 2.0).await.unwrap();
        let after = service.get_analytics().await.unwrap();
        // 2.0*0.2 + 4.0*0.8 = 3.6 — the stale snapshot is gone
        assert!((after[0].ema_score - 3.6).abs() < 1e-9);
        assert_eq!(storage.listings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_ttl_forces_refetch() {
        let config = EngineConfig {
            cache_ttl_ms: 20,
            ..EngineConfig::default()
        };
        let storage = Arc::new(CountingStorage {
            inner: InMemoryStorage::new(),
            listings: AtomicUsize::new(0),
        });
        let service = MetricsService::new(storage.clone(), config);

        service.update_driver_metrics("D1", 4.0).await.unwrap();
        service.get_analytics().await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        service.get_analytics().await.unwrap();
        assert_eq!(storage.listings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_driver_detail_for_unknown_driver() {
        let (_, service) = service();
        let detail = service.get_driver_detail("ghost").await.unwrap();
        assert!(detail.metrics.is_none());
        assert!(detail.feedbacks.is_empty());
        assert!(detail.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_analytics_report_wraps_metrics_and_alerts() {
        let (_, service) = service();
        service.update_driver_metrics("D2", 1.2).await.unwrap();
        service.update_driver_metrics("D1", 4.8).await.unwrap();

        let report = service.analytics_report().await.unwrap();
        assert_eq!(report.metrics.len(), 2);
        // ordered by driver ID ascending
        assert_eq!(report.metrics[0].driver_id, "D1");
        assert_eq!(report.alerts.len(), 1);
        assert!(report.generated_at <= Utc::now());
    }
}
