//! # Mock Collaborators
//!
//! Utilities for testing activation without a real provider or real services.
//!
//! - [`MockProvider`] records every `materialize` call, builds each instance once and can
//!   be told to fail for a given key. Keys without a builder get a [`MockInstance`].
//! - [`InitProbe`] is an async background service that writes to a shared
//!   [`InitJournal`] when initialized. It can also fail, or suspend until released,
//!   which is how re-entrant activation is exercised.
//!
//! # Example
//! ```ignore
//! struct ClockTag;
//! type Clock = InitProbe<ClockTag>;
//!
//! let journal = InitJournal::new();
//! let provider = MockProvider::new().with({
//!     let journal = journal.clone();
//!     move || Clock::new(journal.clone())
//! });
//! // ... activate ...
//! assert_eq!(journal.count_of::<Clock>(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::framework::error::BoxError;
use crate::framework::provider::ServiceProvider;
use crate::framework::service::{AsyncBackgroundService, BackgroundService, Instance, ServiceKey};

type Builder = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Placeholder instance for keys the mock has no builder for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockInstance {
    pub key: ServiceKey,
}

#[derive(Default)]
struct MockState {
    builders: HashMap<ServiceKey, Builder>,
    instances: HashMap<ServiceKey, Instance>,
    failures: HashSet<ServiceKey>,
    calls: Vec<ServiceKey>,
    constructed: Vec<ServiceKey>,
}

/// A provider that records what it was asked for.
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `T` with `build` on first access to `ServiceKey::of::<T>()`.
    pub fn with<T, F>(self, build: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.with_key(ServiceKey::of::<T>(), move || {
            let instance: Instance = Arc::new(build());
            instance
        })
    }

    pub fn with_key<F>(self, key: ServiceKey, build: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.state.lock().builders.insert(key, Arc::new(build));
        self
    }

    /// Every `materialize` call for `T` fails.
    pub fn failing_on<T: ?Sized + 'static>(self) -> Self {
        self.state.lock().failures.insert(ServiceKey::of::<T>());
        self
    }

    /// All `materialize` calls, in call order, including repeats and failures.
    pub fn calls(&self) -> Vec<ServiceKey> {
        self.state.lock().calls.clone()
    }

    pub fn calls_for(&self, key: &ServiceKey) -> usize {
        self.state.lock().calls.iter().filter(|k| *k == key).count()
    }

    /// Keys in the order their instance was first constructed.
    pub fn construction_order(&self) -> Vec<ServiceKey> {
        self.state.lock().constructed.clone()
    }
}

impl ServiceProvider for MockProvider {
    fn materialize(&self, key: &ServiceKey) -> Result<Instance, BoxError> {
        let mut state = self.state.lock();
        state.calls.push(*key);
        if state.failures.contains(key) {
            return Err(format!("mock provider refused {key}").into());
        }
        if let Some(instance) = state.instances.get(key) {
            return Ok(Arc::clone(instance));
        }
        let instance = match state.builders.get(key) {
            Some(build) => build(),
            None => Arc::new(MockInstance { key: *key }),
        };
        state.instances.insert(*key, Arc::clone(&instance));
        state.constructed.push(*key);
        Ok(instance)
    }
}

/// Shared log of `init_async` calls.
#[derive(Debug, Clone, Default)]
pub struct InitJournal {
    entries: Arc<Mutex<Vec<ServiceKey>>>,
}

impl InitJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: ServiceKey) {
        self.entries.lock().push(key);
    }

    pub fn entries(&self) -> Vec<ServiceKey> {
        self.entries.lock().clone()
    }

    pub fn count(&self, key: &ServiceKey) -> usize {
        self.entries.lock().iter().filter(|k| *k == key).count()
    }

    pub fn count_of<T: ?Sized + 'static>(&self) -> usize {
        self.count(&ServiceKey::of::<T>())
    }
}

enum ProbeBehavior {
    Succeed,
    Fail,
    WaitFor(Arc<Notify>),
}

/// An async background service for tests. `Tag` only makes each probe a distinct type.
pub struct InitProbe<Tag: 'static> {
    journal: InitJournal,
    behavior: ProbeBehavior,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag: 'static> InitProbe<Tag> {
    pub fn new(journal: InitJournal) -> Self {
        Self::with_behavior(journal, ProbeBehavior::Succeed)
    }

    /// `init_async` records the call, then fails.
    pub fn failing(journal: InitJournal) -> Self {
        Self::with_behavior(journal, ProbeBehavior::Fail)
    }

    /// `init_async` records the call, then waits until `gate` is notified.
    pub fn gated(journal: InitJournal, gate: Arc<Notify>) -> Self {
        Self::with_behavior(journal, ProbeBehavior::WaitFor(gate))
    }

    fn with_behavior(journal: InitJournal, behavior: ProbeBehavior) -> Self {
        Self {
            journal,
            behavior,
            _tag: PhantomData,
        }
    }
}

impl<Tag: 'static> BackgroundService for InitProbe<Tag> {}

#[async_trait]
impl<Tag: 'static> AsyncBackgroundService for InitProbe<Tag> {
    async fn init_async(&self) -> Result<(), BoxError> {
        self.journal.record(ServiceKey::of::<Self>());
        match &self.behavior {
            ProbeBehavior::Succeed => Ok(()),
            ProbeBehavior::Fail => Err("probe initializer failed".into()),
            ProbeBehavior::WaitFor(gate) => {
                gate.notified().await;
                Ok(())
            }
        }
    }
}
