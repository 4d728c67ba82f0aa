//! Counters for pipeline activity.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pipeline metrics (thread-safe counters, clones share state).
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    runs_started: AtomicU64,
    runs_succeeded: AtomicU64,
    step_failures: AtomicU64,
    infra_failures: AtomicU64,
    formats_applied: AtomicU64,
    formats_skipped: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run_started(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_succeeded(&self) {
        self.inner.runs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// A compile, link or run step exited nonzero.
    pub fn record_step_failure(&self) {
        self.inner.step_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A module instance could not run at all.
    pub fn record_infra_failure(&self) {
        self.inner.infra_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_format(&self, applied: bool) {
        let counter = if applied {
            &self.inner.formats_applied
        } else {
            &self.inner.formats_skipped
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            runs_started: c.runs_started.load(Ordering::Relaxed),
            runs_succeeded: c.runs_succeeded.load(Ordering::Relaxed),
            step_failures: c.step_failures.load(Ordering::Relaxed),
            infra_failures: c.infra_failures.load(Ordering::Relaxed),
            formats_applied: c.formats_applied.load(Ordering::Relaxed),
            formats_skipped: c.formats_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub runs_succeeded: u64,
    pub step_failures: u64,
    pub infra_failures: u64,
    pub formats_applied: u64,
    pub formats_skipped: u64,
}

impl MetricsSnapshot {
    /// Share of finished runs whose program exited 0.
    pub fn success_rate(&self) -> f64 {
        let finished = self.runs_succeeded + self.step_failures + self.infra_failures;
        if finished == 0 {
            return 0.0;
        }
        self.runs_succeeded as f64 / finished as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Pipeline Metrics".to_string());
        lines.push("=".repeat(32));
        lines.push(format!("  Runs started:    {}", self.runs_started));
        lines.push(format!("  Runs succeeded:  {}", self.runs_succeeded));
        lines.push(format!("  Step failures:   {}", self.step_failures));
        lines.push(format!("  Infra failures:  {}", self.infra_failures));
        lines.push(format!("  Success rate:    {:.1}%", self.success_rate() * 100.0));
        lines.push(format!("  Formats applied: {}", self.formats_applied));
        lines.push(format!("  Formats skipped: {}", self.formats_skipped));
        lines.join("\n")
    }
}
