pub mod cache;
pub mod kafka;
pub mod lookup;
pub mod metrics;
pub mod storage;
