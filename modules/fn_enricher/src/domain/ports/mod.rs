pub mod cache;
pub mod lookup;
pub mod metrics;
pub mod rejection;

pub use cache::UserCache;
pub use lookup::{AttributeLookup, Lookups};
pub use metrics::{MetricsSink, NoopMetrics};
pub use rejection::RejectionPublisher;
