use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::framework::{
    ActivationError, Instance, Scope, ScopeClassifier, ServiceCatalog, ServiceKey, ServiceProvider,
};
use crate::lifecycle::activation::{ActivationRecord, ActivationTable, Begun, StartupState};
use crate::lifecycle::ledger::ScopeLedger;
use crate::provider::SingletonProvider;

/// Scope-aware, dependency-ordered activation of singleton services.
///
/// `Orchestrator` is responsible for:
/// - **Scope Gating**: Only services whose scope matches the current execution context
///   auto-start during [`run_bulk_activation`](Self::run_bulk_activation)
/// - **Dependency Ordering**: A service's declared dependencies reach `Started` before it does
/// - **Exactly-once Initialization**: Each async background service has `init_async`
///   called at most once, however many paths lead to it
/// - **On-Demand Activation**: [`activate`](Self::activate) starts one service (and its
///   dependency chain) at any time, before, during or after the bulk pass
///
/// One orchestrator serves one execution context. It owns the scope ledger and the
/// activation table; instances themselves belong to the provider.
///
/// # Example
///
/// ```ignore
/// let orchestrator = Orchestrator::from_catalog(catalog, Arc::new(classifier))?;
/// orchestrator.declare_scope(ServiceKey::of::<Indexer>(), Scope::DedicatedWorker)?;
///
/// orchestrator.run_bulk_activation().await?;
/// let indexer = orchestrator.activate_as::<Indexer>().await?;
/// ```
pub struct Orchestrator {
    catalog: Arc<ServiceCatalog>,
    provider: Arc<dyn ServiceProvider>,
    classifier: Arc<dyn ScopeClassifier>,
    ledger: Mutex<ScopeLedger>,
    table: Mutex<ActivationTable>,
    bulk_ran: AtomicBool,
}

impl Orchestrator {
    /// Creates an orchestrator over `catalog`.
    ///
    /// Scopes carried by registrations are declared on the ledger here, in registration
    /// order. Two scopes for the same key fail with [`ActivationError::DuplicateScope`].
    pub fn new(
        catalog: impl Into<Arc<ServiceCatalog>>,
        provider: Arc<dyn ServiceProvider>,
        classifier: Arc<dyn ScopeClassifier>,
    ) -> Result<Self, ActivationError> {
        let catalog = catalog.into();
        let mut ledger = ScopeLedger::new();
        for registration in catalog.iter() {
            if let Some(scope) = registration.declared_scope() {
                ledger.declare(registration.key(), scope)?;
            }
        }
        debug!(
            services = catalog.len(),
            scopes = ledger.len(),
            context = %classifier.current(),
            "Orchestrator created"
        );

        Ok(Self {
            catalog,
            provider,
            classifier,
            ledger: Mutex::new(ledger),
            table: Mutex::new(ActivationTable::new()),
            bulk_ran: AtomicBool::new(false),
        })
    }

    /// Creates an orchestrator backed by a [`SingletonProvider`] over the same catalog.
    pub fn from_catalog(
        catalog: impl Into<Arc<ServiceCatalog>>,
        classifier: Arc<dyn ScopeClassifier>,
    ) -> Result<Self, ActivationError> {
        let catalog = catalog.into();
        let provider = Arc::new(SingletonProvider::new(Arc::clone(&catalog)));
        Self::new(catalog, provider, classifier)
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn provider(&self) -> &Arc<dyn ServiceProvider> {
        &self.provider
    }

    pub fn classifier(&self) -> &dyn ScopeClassifier {
        self.classifier.as_ref()
    }

    /// Records the desired auto-start scope for `key`.
    ///
    /// Must happen before activation begins: once the activation table exists, the
    /// declaration is still recorded but existing records keep the scope they were built with.
    pub fn declare_scope(&self, key: ServiceKey, scope: Scope) -> Result<(), ActivationError> {
        self.ledger.lock().declare(key, scope)?;
        if self.table.lock().is_populated() {
            warn!(service = %key, %scope, "Scope declared after activation began; ignored by existing records");
        } else {
            debug!(service = %key, %scope, "Scope declared");
        }
        Ok(())
    }

    /// Activates every service whose scope matches the current context.
    ///
    /// Runs once; later calls return immediately. Services are visited in registration
    /// order and each one's dependencies are activated first. The first failure aborts the
    /// pass and is returned; services already started stay started.
    #[instrument(skip_all, fields(context = %self.classifier.current()))]
    pub async fn run_bulk_activation(&self) -> Result<(), ActivationError> {
        if self.bulk_ran.swap(true, Ordering::SeqCst) {
            debug!("Bulk activation already ran");
            return Ok(());
        }

        let keys = self.ensure_table();
        info!(services = keys.len(), "Bulk activation started");

        for key in keys {
            if let Err(e) = self.activate_record(key, None, false).await {
                error!(service = %key, error = %e, "Bulk activation aborted");
                return Err(e);
            }
        }

        info!(started = self.started_count(), "Bulk activation complete");
        Ok(())
    }

    /// Forces activation of `key` and its dependency chain, regardless of scope.
    ///
    /// Returns `Ok(None)` when `key` is not tracked; such a service has to be fetched from
    /// the provider directly.
    #[instrument(skip_all, fields(service = %key))]
    pub async fn activate(&self, key: ServiceKey) -> Result<Option<Instance>, ActivationError> {
        self.ensure_table();
        if !self.table.lock().contains(&key) {
            debug!("Service not tracked");
            return Ok(None);
        }

        self.activate_record(key, None, true).await?;
        self.provider
            .materialize(&key)
            .map(Some)
            .map_err(|source| ActivationError::Materialize {
                service: key,
                source,
            })
    }

    /// Typed [`activate`](Self::activate) for a service registered under its own type.
    pub async fn activate_as<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, ActivationError> {
        let key = ServiceKey::of::<T>();
        let instance = self.activate(key).await?;
        instance.map(|i| downcast::<T>(key, i)).transpose()
    }

    /// Best-effort lookup for interface-style keys.
    ///
    /// Tries `key` itself first. Otherwise activates the first registration, in
    /// registration order, whose implementation is `key` or whose service key is
    /// assignable from `key`.
    #[instrument(skip_all, fields(service = %key))]
    pub async fn find_by_capability(
        &self,
        key: ServiceKey,
    ) -> Result<Option<Instance>, ActivationError> {
        if let Some(instance) = self.activate(key).await? {
            return Ok(Some(instance));
        }

        let Some(candidate) = self.catalog.find_assignable(&key).map(|r| r.key()) else {
            debug!("No registration can serve this key");
            return Ok(None);
        };
        debug!(resolved = %candidate, "Resolved through registration");
        self.activate(candidate).await
    }

    /// Typed [`find_by_capability`](Self::find_by_capability): looks up `T` and downcasts
    /// the instance to `T`.
    pub async fn find_as<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, ActivationError> {
        let key = ServiceKey::of::<T>();
        let instance = self.find_by_capability(key).await?;
        instance.map(|i| downcast::<T>(key, i)).transpose()
    }

    /// Current state of `key`, or `None` if it is not tracked (or activation has not begun).
    pub fn state_of(&self, key: &ServiceKey) -> Option<StartupState> {
        self.table.lock().get(key).map(|r| r.state())
    }

    /// Snapshot of the record for `key`.
    pub fn record_of(&self, key: &ServiceKey) -> Option<ActivationRecord> {
        self.table.lock().get(key).cloned()
    }

    /// Snapshot of all records, in registration order.
    pub fn records(&self) -> Vec<ActivationRecord> {
        self.table.lock().iter().cloned().collect()
    }

    /// Keys of started services, in the order they reached `Started`.
    pub fn started_in_order(&self) -> Vec<ServiceKey> {
        let mut started: Vec<_> = self
            .table
            .lock()
            .iter()
            .filter_map(|r| r.order().map(|order| (order, r.key())))
            .collect();
        started.sort_by_key(|(order, _)| *order);
        started.into_iter().map(|(_, key)| key).collect()
    }

    pub fn started_count(&self) -> usize {
        self.table.lock().started_count()
    }

    /// Builds the activation table on first use. Returns all tracked keys in registration order.
    fn ensure_table(&self) -> Vec<ServiceKey> {
        let mut table = self.table.lock();
        if !table.is_populated() {
            let ledger = self.ledger.lock();
            let created = table.populate(&self.catalog, &ledger, self.classifier.as_ref());
            debug!(created, "Activation table built");
        }
        table.keys()
    }

    fn begin(
        &self,
        key: &ServiceKey,
        demanded_by: Option<ServiceKey>,
        is_required: bool,
    ) -> Option<Begun> {
        self.table.lock().begin(key, demanded_by, is_required)
    }

    fn complete(&self, key: &ServiceKey) -> Option<usize> {
        self.table.lock().complete(key)
    }

    fn claim_initializer(&self, key: &ServiceKey) -> bool {
        self.table.lock().claim_initializer(key)
    }

    /// The activation state machine. Every table access is a short synchronous lock; no
    /// lock is held across an `.await`.
    fn activate_record(
        &self,
        key: ServiceKey,
        demanded_by: Option<ServiceKey>,
        is_required: bool,
    ) -> BoxFuture<'_, Result<(), ActivationError>> {
        async move {
            let Some(begun) = self.begin(&key, demanded_by, is_required) else {
                return Ok(());
            };
            match demanded_by {
                Some(dependant) => debug!(service = %key, %dependant, "Starting dependency"),
                None => debug!(service = %key, "Starting service"),
            }

            for dependency in &begun.dependencies {
                self.activate_record(*dependency, Some(key), false).await?;
            }

            let instance = self
                .provider
                .materialize(&key)
                .map_err(|source| ActivationError::Materialize {
                    service: key,
                    source,
                })?;
            let order = self.complete(&key);
            info!(service = %key, ?order, "Service started");

            let initializer = self
                .catalog
                .registration(begun.registration)
                .and_then(|r| r.capabilities().initializer_for(&instance));
            if let Some(init) = initializer {
                if self.claim_initializer(&key) {
                    info!(service = %key, "Running async initializer");
                    init.await.map_err(|source| ActivationError::Initializer {
                        service: key,
                        source,
                    })?;
                    debug!(service = %key, "Async initializer finished");
                }
            }
            Ok(())
        }
        .boxed()
    }
}

fn downcast<T: Send + Sync + 'static>(
    key: ServiceKey,
    instance: Instance,
) -> Result<Arc<T>, ActivationError> {
    instance
        .downcast::<T>()
        .map_err(|_| ActivationError::TypeMismatch {
            service: key,
            expected: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{InitJournal, InitProbe, MockProvider};
    use crate::framework::{ExecutionContext, FixedScopeClassifier, ServiceRegistration};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    struct ClockTag;
    struct FeedTag;
    type Clock = InitProbe<ClockTag>;
    type Feed = InitProbe<FeedTag>;

    #[derive(Debug)]
    struct Beacon;
    #[derive(Debug)]
    struct Indexer;
    #[derive(Debug)]
    struct Renderer;
    #[derive(Debug)]
    struct Missing;

    fn window() -> Arc<dyn ScopeClassifier> {
        Arc::new(FixedScopeClassifier::new(ExecutionContext::Window))
    }

    fn build(catalog: ServiceCatalog, provider: MockProvider) -> (Orchestrator, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let orchestrator = Orchestrator::new(catalog, provider.clone(), window()).unwrap();
        (orchestrator, provider)
    }

    fn clock_provider(journal: &InitJournal) -> MockProvider {
        let journal = journal.clone();
        MockProvider::new().with(move || Clock::new(journal.clone()))
    }

    fn clock_registration() -> ServiceRegistration {
        ServiceRegistration::of::<Clock>()
            .async_background::<Clock>()
            .scope(Scope::All)
    }

    #[tokio::test]
    async fn test_dependency_starts_first_and_initializes_once() {
        let journal = InitJournal::new();
        let catalog = ServiceCatalog::new().add(clock_registration()).add(
            ServiceRegistration::of::<Beacon>()
                .depends_on::<Clock>()
                .scope(Scope::Window),
        );
        let (orchestrator, provider) = build(catalog, clock_provider(&journal));

        orchestrator.run_bulk_activation().await.unwrap();

        let clock = orchestrator.record_of(&ServiceKey::of::<Clock>()).unwrap();
        let beacon = orchestrator.record_of(&ServiceKey::of::<Beacon>()).unwrap();
        assert_eq!(clock.state(), StartupState::Started);
        assert_eq!(beacon.state(), StartupState::Started);
        assert!(clock.order() < beacon.order());
        assert_eq!(journal.count_of::<Clock>(), 1);
        assert!(!beacon.init_called());
        assert_eq!(
            provider.construction_order(),
            vec![ServiceKey::of::<Clock>(), ServiceKey::of::<Beacon>()]
        );
    }

    #[tokio::test]
    async fn test_dependency_registered_after_dependant() {
        let journal = InitJournal::new();
        let catalog = ServiceCatalog::new()
            .add(
                ServiceRegistration::of::<Beacon>()
                    .depends_on::<Clock>()
                    .scope(Scope::Window),
            )
            .add(clock_registration());
        let (orchestrator, _) = build(catalog, clock_provider(&journal));

        orchestrator.run_bulk_activation().await.unwrap();

        assert_eq!(
            orchestrator.started_in_order(),
            vec![ServiceKey::of::<Clock>(), ServiceKey::of::<Beacon>()]
        );
        assert_eq!(journal.count_of::<Clock>(), 1);
    }

    #[tokio::test]
    async fn test_out_of_scope_service_waits_for_demand() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Indexer>().scope(Scope::DedicatedWorker));
        let (orchestrator, provider) = build(catalog, MockProvider::new());
        let indexer = ServiceKey::of::<Indexer>();

        orchestrator.run_bulk_activation().await.unwrap();
        assert_eq!(orchestrator.state_of(&indexer), Some(StartupState::None));
        assert!(provider.calls().is_empty());

        let instance = orchestrator.activate(indexer).await.unwrap();
        assert!(instance.is_some());
        assert_eq!(orchestrator.state_of(&indexer), Some(StartupState::Started));
        assert_eq!(orchestrator.record_of(&indexer).unwrap().demanded_by(), None);
    }

    #[tokio::test]
    async fn test_dependency_pulled_in_despite_scope() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Renderer>()
                .depends_on::<Indexer>()
                .scope(Scope::Window))
            .add(ServiceRegistration::of::<Indexer>().scope(Scope::DedicatedWorker));
        let (orchestrator, _) = build(catalog, MockProvider::new());

        orchestrator.run_bulk_activation().await.unwrap();

        let indexer = orchestrator.record_of(&ServiceKey::of::<Indexer>()).unwrap();
        assert_eq!(indexer.state(), StartupState::Started);
        assert_eq!(indexer.demanded_by(), Some(ServiceKey::of::<Renderer>()));
        assert_eq!(indexer.order(), Some(0));
    }

    #[tokio::test]
    async fn test_activate_before_bulk_keeps_order_and_init() {
        let journal = InitJournal::new();
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Beacon>().scope(Scope::Window))
            .add(clock_registration());
        let (orchestrator, _) = build(catalog, clock_provider(&journal));
        let clock = ServiceKey::of::<Clock>();

        let early = orchestrator.activate_as::<Clock>().await.unwrap();
        assert!(early.is_some());
        assert_eq!(orchestrator.record_of(&clock).unwrap().order(), Some(0));
        assert_eq!(journal.count_of::<Clock>(), 1);

        orchestrator.run_bulk_activation().await.unwrap();
        assert_eq!(orchestrator.record_of(&clock).unwrap().order(), Some(0));
        assert_eq!(
            orchestrator.record_of(&ServiceKey::of::<Beacon>()).unwrap().order(),
            Some(1)
        );
        assert_eq!(journal.count_of::<Clock>(), 1);
    }

    #[tokio::test]
    async fn test_initializer_runs_once_across_paths() {
        let journal = InitJournal::new();
        let catalog = ServiceCatalog::new()
            .add(clock_registration())
            .add(ServiceRegistration::of::<Beacon>().depends_on::<Clock>().scope(Scope::All))
            .add(ServiceRegistration::of::<Renderer>().depends_on::<Clock>());
        let (orchestrator, _) = build(catalog, clock_provider(&journal));

        orchestrator.activate(ServiceKey::of::<Clock>()).await.unwrap();
        orchestrator.activate(ServiceKey::of::<Clock>()).await.unwrap();
        orchestrator.run_bulk_activation().await.unwrap();
        orchestrator.run_bulk_activation().await.unwrap();
        orchestrator.activate(ServiceKey::of::<Renderer>()).await.unwrap();

        assert_eq!(journal.count_of::<Clock>(), 1);
        assert_eq!(orchestrator.started_count(), 3);
    }

    #[tokio::test]
    async fn test_bulk_activation_runs_once() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Beacon>().scope(Scope::Window));
        let (orchestrator, provider) = build(catalog, MockProvider::new());

        orchestrator.run_bulk_activation().await.unwrap();
        let calls = provider.calls().len();
        orchestrator.run_bulk_activation().await.unwrap();
        assert_eq!(provider.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_duplicate_scope_is_a_configuration_error() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Beacon>().scope(Scope::Window));
        let (orchestrator, provider) = build(catalog, MockProvider::new());

        let err = orchestrator
            .declare_scope(ServiceKey::of::<Beacon>(), Scope::All)
            .unwrap_err();
        assert!(matches!(err, ActivationError::DuplicateScope { .. }));
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn test_duplicate_registration_scopes_fail_construction() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Beacon>().scope(Scope::Window))
            .add(ServiceRegistration::of::<Beacon>().scope(Scope::All));
        let result = Orchestrator::new(catalog, Arc::new(MockProvider::new()), window());
        assert!(matches!(
            result,
            Err(ActivationError::DuplicateScope { service }) if service == ServiceKey::of::<Beacon>()
        ));
    }

    #[tokio::test]
    async fn test_late_scope_declaration_has_no_effect() {
        let catalog = ServiceCatalog::new().add(ServiceRegistration::of::<Indexer>());
        let (orchestrator, _) = build(catalog, MockProvider::new());

        orchestrator.run_bulk_activation().await.unwrap();
        orchestrator
            .declare_scope(ServiceKey::of::<Indexer>(), Scope::All)
            .unwrap();

        let indexer = orchestrator.record_of(&ServiceKey::of::<Indexer>()).unwrap();
        assert_eq!(indexer.scope(), Scope::None);
        assert_eq!(indexer.state(), StartupState::None);
    }

    #[tokio::test]
    async fn test_untracked_dependency_is_skipped() {
        let catalog = ServiceCatalog::new().add(
            ServiceRegistration::of::<Beacon>()
                .depends_on::<Missing>()
                .scope(Scope::Window),
        );
        let (orchestrator, provider) = build(catalog, MockProvider::new());

        orchestrator.run_bulk_activation().await.unwrap();

        assert_eq!(
            orchestrator.state_of(&ServiceKey::of::<Beacon>()),
            Some(StartupState::Started)
        );
        assert_eq!(provider.calls_for(&ServiceKey::of::<Missing>()), 0);
        assert!(orchestrator.activate(ServiceKey::of::<Missing>()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_materialize_failure_aborts_bulk() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Renderer>().scope(Scope::All))
            .add(ServiceRegistration::of::<Indexer>().scope(Scope::All));
        let (orchestrator, provider) =
            build(catalog, MockProvider::new().failing_on::<Renderer>());

        let err = orchestrator.run_bulk_activation().await.unwrap_err();
        assert!(matches!(
            err,
            ActivationError::Materialize { service, .. } if service == ServiceKey::of::<Renderer>()
        ));
        assert_eq!(
            orchestrator.state_of(&ServiceKey::of::<Renderer>()),
            Some(StartupState::Starting)
        );
        assert_eq!(
            orchestrator.state_of(&ServiceKey::of::<Indexer>()),
            Some(StartupState::ShouldStart)
        );

        orchestrator.run_bulk_activation().await.unwrap();
        assert_eq!(provider.calls_for(&ServiceKey::of::<Indexer>()), 0);
    }

    #[tokio::test]
    async fn test_failed_dependency_leaves_chain_partially_started() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Beacon>().scope(Scope::All))
            .add(ServiceRegistration::of::<Renderer>()
                .depends_on::<Beacon>()
                .depends_on::<Indexer>())
            .add(ServiceRegistration::of::<Indexer>());
        let (orchestrator, _) = build(catalog, MockProvider::new().failing_on::<Indexer>());

        orchestrator.run_bulk_activation().await.unwrap();
        let err = orchestrator
            .activate(ServiceKey::of::<Renderer>())
            .await
            .unwrap_err();
        assert!(matches!(err, ActivationError::Materialize { service, .. } if service == ServiceKey::of::<Indexer>()));
        assert_eq!(
            orchestrator.state_of(&ServiceKey::of::<Beacon>()),
            Some(StartupState::Started)
        );
        assert_eq!(
            orchestrator.state_of(&ServiceKey::of::<Renderer>()),
            Some(StartupState::Starting)
        );
    }

    #[tokio::test]
    async fn test_initializer_failure_is_not_retried() {
        let journal = InitJournal::new();
        let provider = {
            let journal = journal.clone();
            MockProvider::new().with(move || Clock::failing(journal.clone()))
        };
        let (orchestrator, _) = build(ServiceCatalog::new().add(clock_registration()), provider);
        let clock = ServiceKey::of::<Clock>();

        let err = orchestrator.run_bulk_activation().await.unwrap_err();
        assert!(matches!(err, ActivationError::Initializer { service, .. } if service == clock));

        let record = orchestrator.record_of(&clock).unwrap();
        assert_eq!(record.state(), StartupState::Started);
        assert!(record.init_called());

        assert!(orchestrator.activate(clock).await.unwrap().is_some());
        assert_eq!(journal.count_of::<Clock>(), 1);
    }

    #[tokio::test]
    async fn test_reentry_while_initializer_suspended() {
        let journal = InitJournal::new();
        let gate = Arc::new(Notify::new());
        let provider = {
            let journal = journal.clone();
            let gate = gate.clone();
            MockProvider::new().with(move || Feed::gated(journal.clone(), gate.clone()))
        };
        let catalog = ServiceCatalog::new().add(
            ServiceRegistration::of::<Feed>()
                .async_background::<Feed>()
                .scope(Scope::All),
        );
        let (orchestrator, _) = build(catalog, provider);
        let feed = ServiceKey::of::<Feed>();
        let reentries = AtomicUsize::new(0);

        let bulk = orchestrator.run_bulk_activation();
        let reenter = async {
            while journal.count_of::<Feed>() == 0 {
                tokio::task::yield_now().await;
            }
            assert_eq!(orchestrator.state_of(&feed), Some(StartupState::Started));
            let instance = orchestrator.activate(feed).await.unwrap();
            assert!(instance.is_some());
            reentries.fetch_add(1, Ordering::SeqCst);
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(bulk, reenter);

        result.unwrap();
        assert_eq!(reentries.load(Ordering::SeqCst), 1);
        assert_eq!(journal.count_of::<Feed>(), 1);
    }

    #[tokio::test]
    async fn test_dependency_cycle_terminates() {
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Beacon>()
                .depends_on::<Renderer>()
                .scope(Scope::All))
            .add(ServiceRegistration::of::<Renderer>().depends_on::<Beacon>());
        let (orchestrator, _) = build(catalog, MockProvider::new());

        orchestrator.run_bulk_activation().await.unwrap();
        assert_eq!(
            orchestrator.started_in_order(),
            vec![ServiceKey::of::<Renderer>(), ServiceKey::of::<Beacon>()]
        );
    }

    #[tokio::test]
    async fn test_orders_are_unique_and_dense() {
        let journal = InitJournal::new();
        let catalog = ServiceCatalog::new()
            .add(ServiceRegistration::of::<Renderer>()
                .depends_on::<Beacon>()
                .depends_on::<Clock>()
                .scope(Scope::Window))
            .add(ServiceRegistration::of::<Beacon>())
            .add(clock_registration())
            .add(ServiceRegistration::of::<Indexer>().scope(Scope::All));
        let (orchestrator, _) = build(catalog, clock_provider(&journal));

        orchestrator.run_bulk_activation().await.unwrap();

        let mut orders: Vec<usize> = orchestrator
            .records()
            .iter()
            .filter_map(|r| r.order())
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(
            orchestrator.started_in_order(),
            vec![
                ServiceKey::of::<Beacon>(),
                ServiceKey::of::<Clock>(),
                ServiceKey::of::<Renderer>(),
                ServiceKey::of::<Indexer>(),
            ]
        );
    }

    #[tokio::test]
    async fn test_activate_as_type_mismatch() {
        let catalog = ServiceCatalog::new().add(ServiceRegistration::of::<Beacon>());
        let (orchestrator, _) = build(catalog, MockProvider::new());

        let err = orchestrator.activate_as::<Beacon>().await.unwrap_err();
        assert!(matches!(err, ActivationError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_state_before_activation_begins() {
        let catalog = ServiceCatalog::new().add(ServiceRegistration::of::<Beacon>());
        let (orchestrator, _) = build(catalog, MockProvider::new());
        assert_eq!(orchestrator.state_of(&ServiceKey::of::<Beacon>()), None);
        assert!(orchestrator.records().is_empty());
    }
}
