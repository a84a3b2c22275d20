// === PUBLIC CONTRACT ===
// Models and errors other crates (the server binary, tests) consume.
pub mod contract;

// Re-export the public contract components
pub use contract::{error, model};

// === MODULE DEFINITION ===
// Wiring of config, adapters, domain services and the consumer.
pub mod module;
pub use module::FnEnricher;

// === INTERNAL MODULES ===
// WARNING: These modules are internal implementation details!
// They are exposed only for comprehensive testing and for the server binary.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
#[doc(hidden)]
pub mod pipeline;
