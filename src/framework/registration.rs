//! # Service Registrations
//!
//! A [`ServiceRegistration`] is what the composition root knows about one singleton:
//! its key, how to build it (a factory or a pre-built instance), the keys it depends on,
//! its capabilities and, optionally, the scope it should auto-start in.
//!
//! Dependencies are stated explicitly on the builder. Nothing is inferred from a
//! constructor signature.
//!
//! ```rust
//! use scope_activation::framework::{Scope, ServiceCatalog, ServiceRegistration};
//!
//! struct Config;
//! struct Telemetry;
//!
//! let catalog = ServiceCatalog::new()
//!     .add(ServiceRegistration::with_instance(Config))
//!     .add(
//!         ServiceRegistration::with_factory(|_| Ok(Telemetry))
//!             .depends_on::<Config>()
//!             .scope(Scope::Window),
//!     );
//! assert_eq!(catalog.len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::framework::error::BoxError;
use crate::framework::provider::ServiceProvider;
use crate::framework::scope::Scope;
use crate::framework::service::{AsyncBackgroundService, Capabilities, Instance, ServiceKey};

/// Builds an instance, resolving its own dependencies through the provider.
pub type Factory = Arc<dyn Fn(&dyn ServiceProvider) -> Result<Instance, BoxError> + Send + Sync>;

/// Everything the composition root declares about one singleton service.
#[derive(Clone)]
pub struct ServiceRegistration {
    key: ServiceKey,
    implementation: Option<ServiceKey>,
    instance: Option<Instance>,
    factory: Option<Factory>,
    dependencies: Vec<ServiceKey>,
    assignable_from: Vec<ServiceKey>,
    capabilities: Capabilities,
    scope: Option<Scope>,
}

impl ServiceRegistration {
    /// A bare registration for key `S`, to be completed with
    /// [`implemented_by`](Self::implemented_by) or [`instance`](Self::instance).
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self::for_key(ServiceKey::of::<S>())
    }

    pub fn for_key(key: ServiceKey) -> Self {
        Self {
            key,
            implementation: None,
            instance: None,
            factory: None,
            dependencies: Vec::new(),
            assignable_from: Vec::new(),
            capabilities: Capabilities::none(),
            scope: None,
        }
    }

    /// Registers `T` under its own key, built lazily by `factory`.
    pub fn with_factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn ServiceProvider) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::of::<T>().implemented_by(factory)
    }

    /// Registers a pre-built `T` under its own key.
    pub fn with_instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self::of::<T>().instance(value)
    }

    /// Sets the implementation type `I` and the factory that builds it.
    pub fn implemented_by<I, F>(mut self, factory: F) -> Self
    where
        I: Send + Sync + 'static,
        F: Fn(&dyn ServiceProvider) -> Result<I, BoxError> + Send + Sync + 'static,
    {
        self.implementation = Some(ServiceKey::of::<I>());
        self.factory = Some(Arc::new(move |provider: &dyn ServiceProvider| {
            let value = factory(provider)?;
            let instance: Instance = Arc::new(value);
            Ok(instance)
        }));
        self
    }

    /// Sets a pre-built instance of implementation type `I`.
    pub fn instance<I: Send + Sync + 'static>(mut self, value: I) -> Self {
        self.implementation = Some(ServiceKey::of::<I>());
        self.instance = Some(Arc::new(value));
        self
    }

    /// Declares a dependency on `D`; it is activated before this service.
    pub fn depends_on<D: ?Sized + 'static>(self) -> Self {
        self.depends_on_key(ServiceKey::of::<D>())
    }

    pub fn depends_on_key(mut self, key: ServiceKey) -> Self {
        self.dependencies.push(key);
        self
    }

    /// Lets a lookup for `T` resolve to this registration when `T` itself is not tracked.
    pub fn assignable_from<T: ?Sized + 'static>(mut self) -> Self {
        self.assignable_from.push(ServiceKey::of::<T>());
        self
    }

    /// Tags the implementation as a [`BackgroundService`](crate::framework::BackgroundService).
    pub fn background(mut self) -> Self {
        if !self.capabilities.is_background() {
            self.capabilities = Capabilities::background();
        }
        self
    }

    /// Tags the implementation `T` as an [`AsyncBackgroundService`].
    pub fn async_background<T: AsyncBackgroundService>(mut self) -> Self {
        self.capabilities = Capabilities::async_background::<T>();
        self
    }

    /// Auto-start scope, declared on the ledger when the orchestrator is built.
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn implementation(&self) -> Option<ServiceKey> {
        self.implementation
    }

    pub fn prebuilt_instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    pub fn dependencies(&self) -> &[ServiceKey] {
        &self.dependencies
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn declared_scope(&self) -> Option<Scope> {
        self.scope
    }

    /// True if a lookup for `key` may be served by this registration.
    pub fn is_assignable_from(&self, key: &ServiceKey) -> bool {
        self.key == *key || self.assignable_from.contains(key)
    }
}

impl fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("key", &self.key)
            .field("implementation", &self.implementation)
            .field("prebuilt", &self.instance.is_some())
            .field("dependencies", &self.dependencies)
            .field("capabilities", &self.capabilities)
            .field("scope", &self.scope)
            .finish()
    }
}

/// All registrations of an application, in registration order.
#[derive(Clone, Debug, Default)]
pub struct ServiceCatalog {
    registrations: Vec<ServiceRegistration>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration (builder style).
    pub fn add(mut self, registration: ServiceRegistration) -> Self {
        self.push(registration);
        self
    }

    pub fn push(&mut self, registration: ServiceRegistration) {
        self.registrations.push(registration);
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceRegistration> {
        self.registrations.iter()
    }

    pub fn registration(&self, index: usize) -> Option<&ServiceRegistration> {
        self.registrations.get(index)
    }

    /// The first registration for `key`.
    pub fn get(&self, key: &ServiceKey) -> Option<&ServiceRegistration> {
        self.registrations.iter().find(|r| r.key == *key)
    }

    /// The first registration whose implementation is `key` or whose service key is
    /// assignable from `key`.
    pub fn find_assignable(&self, key: &ServiceKey) -> Option<&ServiceRegistration> {
        self.registrations
            .iter()
            .find(|r| r.implementation == Some(*key) || r.is_assignable_from(key))
    }
}
