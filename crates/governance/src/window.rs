//! Bounded execution history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of samples kept per component.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

#[derive(Debug, Clone, Copy)]
struct ExecutionSample {
    duration: Duration,
    success: bool,
}

/// Rolling window of the most recent executions plus lifetime counters.
#[derive(Debug, Clone)]
pub struct ExecutionWindow {
    samples: VecDeque<ExecutionSample>,
    capacity: usize,
    success_count: u64,
    error_count: u64,
    last_execution: Option<DateTime<Utc>>,
}

impl ExecutionWindow {
    /// Create an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            success_count: 0,
            error_count: 0,
            last_execution: None,
        }
    }

    /// Append an outcome, evicting the oldest sample when full.
    pub fn record(&mut self, duration: Duration, success: bool) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ExecutionSample { duration, success });
        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        self.last_execution = Some(Utc::now());
    }

    /// Samples currently retained.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Snapshot statistics. Latency and success rate cover the retained
    /// samples; counts are lifetime totals.
    pub fn stats(&self, component: &str) -> ExecutionStats {
        if self.samples.is_empty() {
            return ExecutionStats {
                success_count: self.success_count,
                error_count: self.error_count,
                total_executions: self.success_count + self.error_count,
                last_execution: self.last_execution,
                ..ExecutionStats::empty(component)
            };
        }

        let window = self.samples.len();
        let millis = |s: &ExecutionSample| s.duration.as_micros() as f64 / 1000.0;
        let total_ms: f64 = self.samples.iter().map(millis).sum();
        let min_ms = self.samples.iter().map(millis).fold(f64::INFINITY, f64::min);
        let max_ms = self.samples.iter().map(millis).fold(0.0, f64::max);
        let window_successes = self.samples.iter().filter(|s| s.success).count();

        ExecutionStats {
            component: component.to_string(),
            total_executions: self.success_count + self.error_count,
            success_count: self.success_count,
            error_count: self.error_count,
            success_rate: window_successes as f64 / window as f64,
            average_execution_ms: total_ms / window as f64,
            min_execution_ms: min_ms,
            max_execution_ms: max_ms,
            window_size: window,
            last_execution: self.last_execution,
        }
    }
}

impl Default for ExecutionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Point-in-time execution statistics for one component or agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub component: String,
    pub total_executions: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Fraction of successful samples in the window, `0.0` when empty.
    pub success_rate: f64,
    pub average_execution_ms: f64,
    pub min_execution_ms: f64,
    pub max_execution_ms: f64,
    /// Samples the latency figures were computed from.
    pub window_size: usize,
    pub last_execution: Option<DateTime<Utc>>,
}

impl ExecutionStats {
    /// All-zero statistics.
    pub fn empty(component: &str) -> Self {
        Self {
            component: component.to_string(),
            total_executions: 0,
            success_count: 0,
            error_count: 0,
            success_rate: 0.0,
            average_execution_ms: 0.0,
            min_execution_ms: 0.0,
            max_execution_ms: 0.0,
            window_size: 0,
            last_execution: None,
        }
    }
}
