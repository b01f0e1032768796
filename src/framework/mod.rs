//! Building blocks shared by the orchestrator and the composition root.
//!
//! # Main Components
//!
//! - [`ServiceKey`] - Identity of a service (a type or trait object)
//! - [`ServiceRegistration`] / [`ServiceCatalog`] - What the composition root registers
//! - [`Scope`] / [`ScopeClassifier`] - Which execution context a service belongs to
//! - [`ServiceProvider`] - The collaborator that builds and caches instances
//! - [`BackgroundService`] / [`AsyncBackgroundService`] - Capability traits
//! - [`ActivationError`] - Common error type
//!
//! # Testing
//!
//! See [`mock`] for a recording provider and probe services.

pub mod error;
pub mod mock;
pub mod provider;
pub mod registration;
pub mod scope;
pub mod service;

pub use error::{ActivationError, BoxError, UnknownContext};
pub use provider::ServiceProvider;
pub use registration::{Factory, ServiceCatalog, ServiceRegistration};
pub use scope::{ExecutionContext, FixedScopeClassifier, Scope, ScopeClassifier};
pub use service::{AsyncBackgroundService, BackgroundService, Capabilities, Instance, ServiceKey};
