use std::time::Duration;

pub const INVALID_FN_COUNT: &str = "fn_enricher_fn_processor_invalid_fn_count";
pub const FN_HANDLING_DURATION: &str = "fn_enricher_fn_processor_fn_handling_duration";

/// Injected metrics capability. Implementations must be cheap and non-blocking.
pub trait MetricsSink: Send + Sync + 'static {
    fn inc_counter(&self, name: &'static str, labels: &[(&'static str, &str)]);
    fn observe(&self, histogram: &'static str, value: Duration);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn inc_counter(&self, _name: &'static str, _labels: &[(&'static str, &str)]) {}
    fn observe(&self, _histogram: &'static str, _value: Duration) {}
}
