//! In-process metrics registry backing the `MetricsSink` port.

use std::time::Duration;

use dashmap::DashMap;
use tracing::info;

use crate::domain::ports::MetricsSink;

type SeriesKey = (&'static str, Vec<(&'static str, String)>);

/// Count/sum/min/max of observed durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl HistogramSummary {
    fn record(&mut self, value: Duration) {
        if self.count == 0 || value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<Duration> {
        u32::try_from(self.count)
            .ok()
            .filter(|c| *c > 0)
            .map(|c| self.sum / c)
    }
}

/// Counters and histogram summaries keyed by name plus label set.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: DashMap<SeriesKey, u64>,
    histograms: DashMap<&'static str, HistogramSummary>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one counter series; 0 if never incremented.
    pub fn counter(&self, name: &'static str, labels: &[(&'static str, &str)]) -> u64 {
        self.counters
            .get(&series_key(name, labels))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// Sum over every label set of `name`.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .filter(|entry| entry.key().0 == name)
            .map(|entry| *entry.value())
            .sum()
    }

    pub fn histogram(&self, name: &str) -> Option<HistogramSummary> {
        self.histograms.get(name).map(|h| *h)
    }

    /// Log every series at info level.
    pub fn log_summary(&self) {
        for entry in self.counters.iter() {
            let (name, labels) = entry.key();
            info!(metric = *name, labels = ?labels, value = *entry.value(), "counter");
        }
        for entry in self.histograms.iter() {
            let h = entry.value();
            info!(
                metric = *entry.key(),
                count = h.count,
                mean_ms = h.mean().map(|d| d.as_millis() as u64).unwrap_or(0),
                max_ms = h.max.as_millis() as u64,
                "histogram"
            );
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn inc_counter(&self, name: &'static str, labels: &[(&'static str, &str)]) {
        *self.counters.entry(series_key(name, labels)).or_insert(0) += 1;
    }

    fn observe(&self, histogram: &'static str, value: Duration) {
        self.histograms.entry(histogram).or_default().record(value);
    }
}

fn series_key(name: &'static str, labels: &[(&'static str, &str)]) -> SeriesKey {
    let mut labels: Vec<_> = labels.iter().map(|(k, v)| (*k, (*v).to_owned())).collect();
    labels.sort();
    (name, labels)
}
