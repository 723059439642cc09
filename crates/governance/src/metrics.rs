//! Execution metrics: an in-process tracker plus the Prometheus exporter.

use dashmap::DashMap;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};

use verdant_core::{Error, Result};

use crate::window::{ExecutionStats, ExecutionWindow, DEFAULT_WINDOW_SIZE};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Keyed time-series of execution outcomes.
///
/// Used for agents and for any other pipeline stage. Each component's window
/// lives in its own map entry, so concurrent records for the same key are
/// serialized by the entry lock while different keys proceed independently.
pub struct ExecutionMetricsTracker {
    components: DashMap<String, ExecutionWindow>,
    window_size: usize,
}

impl ExecutionMetricsTracker {
    /// Create a tracker with the default window size.
    pub fn new() -> Self {
        Self::with_window_size(DEFAULT_WINDOW_SIZE)
    }

    /// Create a tracker keeping `window_size` samples per component.
    pub fn with_window_size(window_size: usize) -> Self {
        Self {
            components: DashMap::new(),
            window_size,
        }
    }

    /// Record one execution.
    pub fn record(&self, component: &str, duration: Duration, success: bool) {
        self.components
            .entry(component.to_string())
            .or_insert_with(|| ExecutionWindow::new(self.window_size))
            .record(duration, success);

        let outcome = if success { "success" } else { "error" };
        metrics::counter!(
            "verdant_component_executions_total",
            "component" => component.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "verdant_component_duration_seconds",
            "component" => component.to_string()
        )
        .record(duration.as_secs_f64());

        tracing::trace!(
            component = component,
            duration_ms = duration.as_millis() as u64,
            success = success,
            "Recorded execution"
        );
    }

    /// Time `work` and record its outcome; `Ok` counts as success.
    pub async fn track<T, E, F>(&self, component: &str, work: F) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        let started = Instant::now();
        let result = work.await;
        self.record(component, started.elapsed(), result.is_ok());
        result
    }

    /// Statistics for one component; all zeroes if it never executed.
    pub fn metrics(&self, component: &str) -> ExecutionStats {
        self.components
            .get(component)
            .map(|window| window.stats(component))
            .unwrap_or_else(|| ExecutionStats::empty(component))
    }

    /// Statistics for every tracked component, keyed by name.
    pub fn all_metrics(&self) -> BTreeMap<String, ExecutionStats> {
        self.components
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats(entry.key())))
            .collect()
    }

    /// Components with the best success rate, faster ones first on ties.
    pub fn top_performers(&self, limit: usize) -> Vec<ExecutionStats> {
        let mut stats = self.executed();
        stats.sort_by(|a, b| {
            cmp_f64(b.success_rate, a.success_rate)
                .then_with(|| cmp_f64(a.average_execution_ms, b.average_execution_ms))
                .then_with(|| a.component.cmp(&b.component))
        });
        stats.truncate(limit);
        stats
    }

    /// Components with the highest average latency.
    pub fn slowest_components(&self, limit: usize) -> Vec<ExecutionStats> {
        let mut stats = self.executed();
        stats.sort_by(|a, b| {
            cmp_f64(b.average_execution_ms, a.average_execution_ms)
                .then_with(|| a.component.cmp(&b.component))
        });
        stats.truncate(limit);
        stats
    }

    /// Components that failed at least once, most errors first.
    pub fn components_with_errors(&self) -> Vec<ExecutionStats> {
        let mut stats: Vec<_> = self
            .executed()
            .into_iter()
            .filter(|s| s.error_count > 0)
            .collect();
        stats.sort_by(|a, b| {
            b.error_count
                .cmp(&a.error_count)
                .then_with(|| a.component.cmp(&b.component))
        });
        stats
    }

    /// Forget one component. Returns whether it was tracked.
    pub fn reset(&self, component: &str) -> bool {
        let removed = self.components.remove(component).is_some();
        if removed {
            tracing::debug!(component = component, "Reset component metrics");
        }
        removed
    }

    /// Forget every component.
    pub fn reset_all(&self) {
        self.components.clear();
        tracing::debug!("Reset all component metrics");
    }

    /// JSON-safe summary for dashboards and log lines.
    pub fn summary(&self) -> MetricsSummary {
        let components = self.all_metrics();
        let total_executions: u64 = components.values().map(|s| s.total_executions).sum();
        let total_successes: u64 = components.values().map(|s| s.success_count).sum();
        let active: Vec<_> = components.values().filter(|s| s.window_size > 0).collect();
        let average_execution_ms = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|s| s.average_execution_ms).sum::<f64>() / active.len() as f64
        };

        MetricsSummary {
            total_components: components.len(),
            total_executions,
            overall_success_rate: if total_executions == 0 {
                0.0
            } else {
                total_successes as f64 / total_executions as f64
            },
            average_execution_ms,
            components,
        }
    }

    fn executed(&self) -> Vec<ExecutionStats> {
        self.all_metrics()
            .into_values()
            .filter(|s| s.total_executions > 0)
            .collect()
    }
}

impl Default for ExecutionMetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate view returned by [`ExecutionMetricsTracker::summary`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_components: usize,
    pub total_executions: u64,
    pub overall_success_rate: f64,
    pub average_execution_ms: f64,
    pub components: BTreeMap<String, ExecutionStats>,
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_unknown_component_is_zeroed() {
        let tracker = ExecutionMetricsTracker::new();
        let stats = tracker.metrics("never_ran");
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.average_execution_ms, 0.0);
    }

    #[test]
    fn test_window_keeps_last_hundred() {
        let tracker = ExecutionMetricsTracker::new();
        tracker.record("classifier", ms(5000), true);
        for _ in 0..100 {
            tracker.record("classifier", ms(120), true);
        }
        let stats = tracker.metrics("classifier");
        assert_eq!(stats.window_size, 100);
        assert_eq!(stats.total_executions, 101);
        assert_eq!(stats.average_execution_ms, 120.0);
        assert_eq!(stats.max_execution_ms, 120.0);
    }

    #[test]
    fn test_derived_views_skip_idle_components() {
        let tracker = ExecutionMetricsTracker::new();
        tracker.record("fast", ms(10), true);
        tracker.record("slow", ms(900), true);
        tracker.record("flaky", ms(50), true);
        tracker.record("flaky", ms(50), false);

        let top = tracker.top_performers(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].component, "fast");
        assert_eq!(top[1].component, "slow");

        let slowest = tracker.slowest_components(1);
        assert_eq!(slowest[0].component, "slow");

        let errors = tracker.components_with_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].component, "flaky");
    }

    #[test]
    fn test_reset_and_reset_all() {
        let tracker = ExecutionMetricsTracker::new();
        tracker.record("a", ms(1), true);
        tracker.record("b", ms(1), false);

        assert!(tracker.reset("a"));
        assert!(!tracker.reset("a"));
        assert_eq!(tracker.metrics("a").total_executions, 0);
        assert_eq!(tracker.all_metrics().len(), 1);

        tracker.reset_all();
        assert!(tracker.all_metrics().is_empty());
    }

    #[test]
    fn test_summary_is_json_safe() {
        let tracker = ExecutionMetricsTracker::new();
        assert_eq!(tracker.summary().overall_success_rate, 0.0);

        tracker.record("a", ms(10), true);
        tracker.record("a", ms(30), false);
        let summary = tracker.summary();
        assert_eq!(summary.total_executions, 2);
        assert_eq!(summary.overall_success_rate, 0.5);
        assert_eq!(summary.average_execution_ms, 20.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["components"]["a"]["errorCount"], 1);
    }

    #[tokio::test]
    async fn test_track_records_outcome() {
        let tracker = ExecutionMetricsTracker::new();
        let ok: std::result::Result<u32, String> = tracker.track("stage", async { Ok(7) }).await;
        let err: std::result::Result<u32, String> =
            tracker.track("stage", async { Err("boom".to_string()) }).await;

        assert_eq!(ok.unwrap(), 7);
        assert!(err.is_err());
        let stats = tracker.metrics("stage");
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.error_count, 1);
    }
}
