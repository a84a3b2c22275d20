use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::LookupError;

/// Transport-agnostic port resolving one attribute for a first name.
/// `name` is never empty: validation runs before any lookup.
#[async_trait]
pub trait AttributeLookup<T>: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<T, LookupError>;
}

/// The three lookups the enrichment fans out to.
#[derive(Clone)]
pub struct Lookups {
    pub age: Arc<dyn AttributeLookup<i32>>,
    pub gender: Arc<dyn AttributeLookup<String>>,
    pub nationality: Arc<dyn AttributeLookup<String>>,
}
