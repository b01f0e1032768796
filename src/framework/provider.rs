//! # ServiceProvider Trait
//!
//! The provider owns instance construction and caching. The orchestrator never builds a
//! service itself; it asks the provider to materialize one and relies on the provider
//! returning the same instance for the same key every time.

use std::sync::Arc;

use crate::framework::error::BoxError;
use crate::framework::service::{Instance, ServiceKey};

/// Builds and caches singleton instances.
pub trait ServiceProvider: Send + Sync {
    /// Returns the instance for `key`, constructing it on first access.
    fn materialize(&self, key: &ServiceKey) -> Result<Instance, BoxError>;
}

impl<'a> dyn ServiceProvider + 'a {
    /// Typed lookup for use inside factories: materializes `T` and downcasts it.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, BoxError> {
        let key = ServiceKey::of::<T>();
        self.materialize(&key)?
            .downcast::<T>()
            .map_err(|_| format!("service {key} is not a {}", std::any::type_name::<T>()).into())
    }
}
