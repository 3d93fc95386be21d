//! Per-phase diagnostics
//!
//! Counters and timings collected while generating. They are read-only for
//! callers and never influence the layout; two results with the same layout
//! compare equal whatever their metrics say.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use serde::Serialize;
use strum::{Display, EnumIter};
use tracing::debug_span;

/// Pipeline phase
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Partition,
    Place,
    Graph,
    Carve,
    Normalize,
    Analyze,
    Repair,
    Prune,
    Finalize,
}

/// Counters and timings of one generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    #[serde(skip)]
    enabled: bool,
    counters: BTreeMap<String, u64>,
    timings: BTreeMap<Phase, Duration>,
}

impl Metrics {
    /// Create a collector; a disabled one records nothing
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Add to a counter
    pub fn add(&mut self, key: &str, amount: usize) {
        if self.enabled {
            *self.counters.entry(key.to_string()).or_default() += amount as u64;
        }
    }

    /// Current value of a counter (0 when never recorded)
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    pub fn timing(&self, phase: Phase) -> Option<Duration> {
        self.timings.get(&phase).copied()
    }

    pub fn timings(&self) -> &BTreeMap<Phase, Duration> {
        &self.timings
    }

    /// Sum of all phase timings
    pub fn total_time(&self) -> Duration {
        self.timings.values().sum()
    }

    /// Run `f` inside a tracing span for `phase` and record how long it took
    pub fn time<T>(&mut self, phase: Phase, f: impl FnOnce() -> T) -> T {
        let _span = debug_span!("phase", %phase).entered();
        let started = Instant::now();
        let out = f();
        if self.enabled {
            *self.timings.entry(phase).or_default() += started.elapsed();
        }
        out
    }

    /// Human-readable listing, one entry per line
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (phase, elapsed) in &self.timings {
            let name = phase.to_string();
            let _ = writeln!(out, "{:<12} {:>10.3} ms", name, elapsed.as_secs_f64() * 1000.0);
        }
        if !self.timings.is_empty() {
            let total = self.total_time().as_secs_f64() * 1000.0;
            let _ = writeln!(out, "{:<12} {:>10.3} ms", "total", total);
        }
        for (key, value) in &self.counters {
            let _ = writeln!(out, "{:<28} {:>6}", key, value);
        }
        out
    }
}
