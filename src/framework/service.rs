//! # Service Identities & Capabilities
//!
//! Every service the orchestrator tracks is identified by a [`ServiceKey`] built from a
//! Rust type. Trait objects are valid keys too (`ServiceKey::of::<dyn Clock>()`), which is
//! how an interface-style registration is expressed.
//!
//! Capabilities are tagged on a registration when it is built, not discovered at runtime:
//!
//! - [`BackgroundService`] marks a service that should auto-start wherever its scope allows.
//!   With no explicit scope, such a service defaults to [`Scope::All`](crate::framework::Scope::All).
//! - [`AsyncBackgroundService`] additionally needs exactly one `init_async` call after
//!   it is constructed.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::framework::error::BoxError;

/// A materialized service instance, as handed out by a provider.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Identity of a service: a type (or trait object) key.
#[derive(Clone, Copy)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceKey {
    /// Key for the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Full type name, e.g. `my_app::services::Clock`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Last path segment of the type name with generics stripped, e.g. `Clock`.
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.trim_start_matches("dyn ");
        let base = base.split('<').next().unwrap_or(base);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// True if `name` is either the full or the short type name of this key.
    pub fn matches_name(&self, name: &str) -> bool {
        self.type_name == name || self.short_name() == name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.type_name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Marker for services that auto-start in every context their scope matches.
pub trait BackgroundService: Send + Sync + 'static {}

/// A background service that needs one asynchronous setup call after construction.
///
/// The orchestrator guarantees `init_async` runs at most once per service key, after the
/// service's dependencies have been activated.
#[async_trait]
pub trait AsyncBackgroundService: BackgroundService {
    async fn init_async(&self) -> Result<(), BoxError>;
}

type InitHook = Arc<dyn Fn(Instance) -> Option<BoxFuture<'static, Result<(), BoxError>>> + Send + Sync>;

/// Capability tags attached to a registration.
#[derive(Clone, Default)]
pub struct Capabilities {
    background: bool,
    initializer: Option<InitHook>,
}

impl Capabilities {
    /// No capabilities: the service only starts when something demands it.
    pub fn none() -> Self {
        Self::default()
    }

    /// The implementation is a [`BackgroundService`].
    pub fn background() -> Self {
        Self {
            background: true,
            initializer: None,
        }
    }

    /// The implementation `T` is an [`AsyncBackgroundService`].
    ///
    /// The initializer is bound to `T` here; at activation time the materialized instance
    /// is downcast to `T` once. An instance of any other type simply has no initializer.
    pub fn async_background<T: AsyncBackgroundService>() -> Self {
        let hook: InitHook = Arc::new(|instance: Instance| {
            let service = instance.downcast::<T>().ok()?;
            Some(async move { service.init_async().await }.boxed())
        });
        Self {
            background: true,
            initializer: Some(hook),
        }
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_async_background(&self) -> bool {
        self.initializer.is_some()
    }

    /// The pending `init_async` call for `instance`, if it exposes one.
    pub(crate) fn initializer_for(
        &self,
        instance: &Instance,
    ) -> Option<BoxFuture<'static, Result<(), BoxError>>> {
        self.initializer
            .as_ref()
            .and_then(|hook| hook(Arc::clone(instance)))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("background", &self.background)
            .field("async_background", &self.is_async_background())
            .finish()
    }
}
