//! # Activation Table
//!
//! One [`ActivationRecord`] per registered service key, built in a single pass from the
//! catalog and the scope ledger. Records only ever move forward through
//! [`StartupState`]; the orchestrator drives them with [`ActivationTable::begin`],
//! [`ActivationTable::complete`] and [`ActivationTable::claim_initializer`].

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::framework::{Scope, ScopeClassifier, ServiceCatalog, ServiceKey};
use crate::lifecycle::ledger::ScopeLedger;

/// Activation state of one service. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StartupState {
    /// Not eligible in this context and not demanded yet.
    None,
    /// Eligible; will start on the next pass that reaches it.
    ShouldStart,
    /// Dependencies are being activated.
    Starting,
    /// Reserved. No transition reaches this state.
    Constructing,
    /// Instance materialized and activation order assigned.
    Started,
}

/// Per-service bookkeeping. This is not the service instance.
#[derive(Debug, Clone)]
pub struct ActivationRecord {
    key: ServiceKey,
    registration: usize,
    scope: Scope,
    background: bool,
    async_background: bool,
    state: StartupState,
    dependencies: Vec<ServiceKey>,
    order: Option<usize>,
    demanded_by: Option<ServiceKey>,
    init_called: bool,
}

impl ActivationRecord {
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Index of the registration this record was built from.
    pub fn registration(&self) -> usize {
        self.registration
    }

    /// Resolved scope: the ledger value, or the capability default.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_async_background(&self) -> bool {
        self.async_background
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    pub fn dependencies(&self) -> &[ServiceKey] {
        &self.dependencies
    }

    /// Position in the sequence of started records, once started.
    pub fn order(&self) -> Option<usize> {
        self.order
    }

    /// The dependant that first pulled this record in, if any.
    pub fn demanded_by(&self) -> Option<ServiceKey> {
        self.demanded_by
    }

    pub fn init_called(&self) -> bool {
        self.init_called
    }

    fn advance(&mut self, next: StartupState) {
        debug_assert!(next >= self.state, "{} moved backward", self.key);
        self.state = next;
    }
}

/// A record that has just moved to `Starting`.
#[derive(Debug)]
pub(crate) struct Begun {
    pub registration: usize,
    pub dependencies: Vec<ServiceKey>,
}

/// All activation records of one orchestrator, in registration order.
#[derive(Debug, Default)]
pub struct ActivationTable {
    records: Vec<ActivationRecord>,
    index: HashMap<ServiceKey, usize>,
    populated: bool,
}

impl ActivationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Creates a record for every registration not yet in the table. Returns how many
    /// were created.
    pub(crate) fn populate(
        &mut self,
        catalog: &ServiceCatalog,
        ledger: &ScopeLedger,
        classifier: &dyn ScopeClassifier,
    ) -> usize {
        let before = self.records.len();
        for (registration, entry) in catalog.iter().enumerate() {
            let key = entry.key();
            if self.index.contains_key(&key) {
                if !self.populated {
                    warn!(service = %key, "Duplicate registration ignored for activation");
                }
                continue;
            }

            let capabilities = entry.capabilities();
            let scope = match ledger.get(&key) {
                Some(scope) if scope != Scope::Default => scope,
                _ => Scope::Default.resolve(capabilities.is_background()),
            };
            let state = if classifier.matches(scope) {
                StartupState::ShouldStart
            } else {
                StartupState::None
            };
            debug!(service = %key, %scope, ?state, "Tracking service");

            self.index.insert(key, self.records.len());
            self.records.push(ActivationRecord {
                key,
                registration,
                scope,
                background: capabilities.is_background(),
                async_background: capabilities.is_async_background(),
                state,
                dependencies: entry.dependencies().to_vec(),
                order: None,
                demanded_by: None,
                init_called: false,
            });
        }
        self.populated = true;
        self.records.len() - before
    }

    pub fn get(&self, key: &ServiceKey) -> Option<&ActivationRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivationRecord> {
        self.records.iter()
    }

    pub fn keys(&self) -> Vec<ServiceKey> {
        self.records.iter().map(|r| r.key).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn started_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == StartupState::Started)
            .count()
    }

    fn record_mut(&mut self, key: &ServiceKey) -> Option<&mut ActivationRecord> {
        let i = *self.index.get(key)?;
        Some(&mut self.records[i])
    }

    /// Entry of the activation state machine.
    ///
    /// Promotes a `None` record to `ShouldStart` when it is required or demanded by a
    /// dependant, then moves a `ShouldStart` record to `Starting`. Returns `None` for an
    /// absent record and for any record that was not exactly `ShouldStart`; such a
    /// record must not be entered again.
    pub(crate) fn begin(
        &mut self,
        key: &ServiceKey,
        demanded_by: Option<ServiceKey>,
        is_required: bool,
    ) -> Option<Begun> {
        let record = self.record_mut(key)?;
        if record.state == StartupState::None && (is_required || demanded_by.is_some()) {
            record.advance(StartupState::ShouldStart);
            record.demanded_by = demanded_by;
        }
        if record.state != StartupState::ShouldStart {
            return None;
        }
        record.advance(StartupState::Starting);
        Some(Begun {
            registration: record.registration,
            dependencies: record.dependencies.clone(),
        })
    }

    /// Assigns the activation order and marks the record `Started`.
    pub(crate) fn complete(&mut self, key: &ServiceKey) -> Option<usize> {
        let order = self.started_count();
        let record = self.record_mut(key)?;
        if record.state == StartupState::Started {
            return record.order;
        }
        record.order = Some(order);
        record.advance(StartupState::Started);
        Some(order)
    }

    /// Sets the initializer flag. True only for the first caller.
    pub(crate) fn claim_initializer(&mut self, key: &ServiceKey) -> bool {
        match self.record_mut(key) {
            Some(record) if !record.init_called => {
                record.init_called = true;
                true
            }
            _ => false,
        }
    }
}
