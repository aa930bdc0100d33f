//! Injected metrics interface.
//!
//! The orchestrator calls [`MetricsSink::record`] after every fix
//! attempt; concrete storage (JSONL, OpenTelemetry, dashboards) lives
//! outside the engine. [`MetricsRecorder`] is the in-memory,
//! append-only aggregator shared by the worker pool.

use std::sync::Mutex;

use serde::Serialize;

pub trait MetricsSink: Send + Sync {
    fn record(&self, rule_id: &str, success: bool, duration_ms: u128, confidence: f64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _rule_id: &str, _success: bool, _duration_ms: u128, _confidence: f64) {}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FixAttemptRecord {
    pub rule_id: String,
    pub success: bool,
    pub duration_ms: u128,
    pub confidence: f64,
}

#[derive(Debug, Default)]
/// Append-only in-memory sink.
pub struct MetricsRecorder {
    attempts: Mutex<Vec<FixAttemptRecord>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<FixAttemptRecord> {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn successes(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|a| a.success)
            .count()
    }
}

impl MetricsSink for MetricsRecorder {
    fn record(&self, rule_id: &str, success: bool, duration_ms: u128, confidence: f64) {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FixAttemptRecord {
                rule_id: rule_id.to_string(),
                success,
                duration_ms,
                confidence,
            });
    }
}
