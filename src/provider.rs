//! # Singleton Provider
//!
//! The reference [`ServiceProvider`]: builds each registered service at most once and hands
//! out the same `Arc` afterwards.
//!
//! - A registration with a pre-built instance returns that instance.
//! - A registration with a factory runs the factory on first access. Factories receive the
//!   provider, so they resolve their own dependencies with
//!   [`resolve`](crate::framework::ServiceProvider).
//! - When a key is registered more than once, the first registration is used, matching
//!   the orchestrator's activation table.
//!
//! Factories run without any lock held. A factory that (directly or indirectly) asks for
//! the key it is building fails with [`ProviderError::CircularDependency`].
//!
//! Construction is tracked per thread. A request for a key that another thread is
//! building waits until that instance is published, so concurrent callers share one
//! singleton. A wait that would close a loop of threads waiting on each other is a
//! dependency cycle and fails instead of blocking.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::framework::{BoxError, Instance, ServiceCatalog, ServiceKey, ServiceProvider};

/// Errors raised by [`SingletonProvider`].
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Service not registered: {0}")]
    NotRegistered(ServiceKey),

    #[error("Service {0} has neither a factory nor an instance")]
    NoConstructor(ServiceKey),

    #[error("Circular dependency while constructing {0}")]
    CircularDependency(ServiceKey),

    #[error("Factory for {service} failed: {source}")]
    Factory {
        service: ServiceKey,
        #[source]
        source: BoxError,
    },
}

#[derive(Default)]
struct ProviderState {
    instances: HashMap<ServiceKey, Instance>,
    /// Keys being built, and the thread building each one.
    constructing: HashMap<ServiceKey, ThreadId>,
    /// Threads blocked on a key another thread is building.
    waiting: HashMap<ThreadId, ServiceKey>,
}

impl ProviderState {
    /// True if `thread` waiting on `key` would wait, directly or through other
    /// waiting threads, on itself.
    fn closes_cycle(&self, thread: ThreadId, key: &ServiceKey) -> bool {
        let mut next = self.constructing.get(key).copied();
        // Each waiting thread appears at most once on the chain.
        for _ in 0..=self.waiting.len() {
            let Some(owner) = next else {
                return false;
            };
            if owner == thread {
                return true;
            }
            next = self
                .waiting
                .get(&owner)
                .and_then(|awaited| self.constructing.get(awaited))
                .copied();
        }
        false
    }
}

enum Claim {
    Ready(Instance),
    Build,
}

/// Builds registered services lazily, once each.
pub struct SingletonProvider {
    catalog: Arc<ServiceCatalog>,
    state: Mutex<ProviderState>,
    published: Condvar,
}

impl SingletonProvider {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self {
            catalog,
            state: Mutex::new(ProviderState::default()),
            published: Condvar::new(),
        }
    }

    /// True if `key` has already been built (or was pre-built and handed out).
    pub fn is_materialized(&self, key: &ServiceKey) -> bool {
        self.state.lock().instances.contains_key(key)
    }

    /// Returns the cached instance, or marks `key` as being built by this thread.
    /// Blocks while another thread is building `key`.
    fn claim(&self, key: &ServiceKey) -> Result<Claim, ProviderError> {
        let current = thread::current().id();
        let mut state = self.state.lock();
        loop {
            if let Some(instance) = state.instances.get(key) {
                return Ok(Claim::Ready(Arc::clone(instance)));
            }
            match state.constructing.get(key).copied() {
                None => {
                    state.constructing.insert(*key, current);
                    return Ok(Claim::Build);
                }
                Some(_) if state.closes_cycle(current, key) => {
                    return Err(ProviderError::CircularDependency(*key));
                }
                Some(owner) => {
                    debug!(service = %key, ?owner, "Waiting for another thread to build service");
                    state.waiting.insert(current, *key);
                    self.published.wait(&mut state);
                    state.waiting.remove(&current);
                }
            }
        }
    }

    /// Stores a built instance and wakes every waiting thread.
    fn publish(&self, key: &ServiceKey, built: Instance) -> Instance {
        let mut state = self.state.lock();
        state.constructing.remove(key);
        let instance = Arc::clone(state.instances.entry(*key).or_insert(built));
        self.published.notify_all();
        instance
    }

    /// Drops this thread's claim on `key` after a failed build. A waiting thread then
    /// tries the factory itself.
    fn abandon(&self, key: &ServiceKey) {
        self.state.lock().constructing.remove(key);
        self.published.notify_all();
    }

    fn construct(&self, key: &ServiceKey) -> Result<Instance, ProviderError> {
        let registration = self
            .catalog
            .get(key)
            .ok_or(ProviderError::NotRegistered(*key))?;

        if let Some(instance) = registration.prebuilt_instance() {
            return Ok(self.publish(key, Arc::clone(instance)));
        }
        let factory = registration
            .factory()
            .ok_or(ProviderError::NoConstructor(*key))?;

        if let Claim::Ready(instance) = self.claim(key)? {
            return Ok(instance);
        }
        debug!(service = %key, "Constructing service");
        let provider: &dyn ServiceProvider = self;
        match factory(provider) {
            Ok(built) => Ok(self.publish(key, built)),
            Err(source) => {
                self.abandon(key);
                Err(ProviderError::Factory {
                    service: *key,
                    source,
                })
            }
        }
    }
}

impl ServiceProvider for SingletonProvider {
    fn materialize(&self, key: &ServiceKey) -> Result<Instance, BoxError> {
        if let Some(instance) = self.state.lock().instances.get(key) {
            return Ok(Arc::clone(instance));
        }

        let instance = self.construct(key).map_err(|e| {
            warn!(service = %key, error = %e, "Materialize failed");
            e
        })?;
        Ok(instance)
    }
}
