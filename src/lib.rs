#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Scope Activation
//!
//! > **Scope-aware, dependency-ordered startup for singleton services.**
//!
//! An application that runs the same service catalog in several execution contexts (a UI
//! window and one or more background workers) needs to decide, per context, which
//! services start eagerly, in which order, and which ones wait until something asks for
//! them. This crate makes that decision from a handful of declarations.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Declarations, not wiring
//!
//! The composition root registers services with their dependencies, capabilities and an
//! optional scope. The orchestrator derives everything else:
//! - **Scope Gating**: A service auto-starts only where its scope matches the current context.
//! - **Dependency Ordering**: Dependencies reach `Started` first, even when they would
//!   not auto-start on their own.
//! - **Exactly-once Initialization**: Async background services get one `init_async` call.
//!
//! ### Construction is somebody else's job
//!
//! The orchestrator never builds instances itself. It asks a
//! [`ServiceProvider`](framework::ServiceProvider) and only tracks state. The bundled
//! [`SingletonProvider`](provider::SingletonProvider) covers the common case; tests use
//! [`MockProvider`](framework::mock::MockProvider).
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! [`ActivationError`](framework::ActivationError) names the service that failed. Collaborator
//! errors (providers, initializers) are carried as boxed sources, so the caller sees both the
//! link of the dependency chain that broke and why.
//!
//! ### 2. Concurrency Model
//! One orchestrator per execution context. Its state sits behind short synchronous locks
//! that are never held across an `.await`, so a re-entrant `activate` while an initializer
//! is suspended returns immediately instead of deadlocking or running the initializer twice.
//!
//! ### 3. Observability
//! Every step is traced with a structured `service` field. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Vocabulary ([`framework`])
//! - **Role**: Service keys, registrations, scopes, capabilities and the provider seam.
//! - **Key items**: [`ServiceRegistration`](framework::ServiceRegistration),
//!   [`Scope`](framework::Scope), [`ScopeClassifier`](framework::ScopeClassifier).
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Role**: The scope ledger, the activation table and the activation algorithm.
//! - **Key items**: [`Orchestrator`](lifecycle::Orchestrator),
//!   [`ScopeAwareHost`](lifecycle::ScopeAwareHost).
//!
//! ### 3. The Provider ([`provider`])
//! - **Role**: Lazily builds each registered service once.
//!
//! ### 4. The Manifest ([`config`])
//! - **Role**: Optional TOML file that pins the context and adds scope declarations.
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! let catalog = ServiceCatalog::new()
//!     .add(ServiceRegistration::with_instance(Clock::default()).async_background::<Clock>())
//!     .add(
//!         ServiceRegistration::with_factory(|p| Ok(Telemetry::new(p.resolve::<Clock>()?)))
//!             .depends_on::<Clock>()
//!             .scope(Scope::Window),
//!     );
//!
//! let orchestrator = Orchestrator::from_catalog(catalog, Arc::new(FixedScopeClassifier::from_env()?))?;
//! orchestrator.run_bulk_activation().await?;
//! ```
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! SCOPE_ACTIVATION_CONTEXT=dedicated-worker RUST_LOG=info cargo run
//! ```

pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod provider;

pub use config::{ActivationConfig, ConfigError};
pub use framework::{
    ActivationError, AsyncBackgroundService, BackgroundService, BoxError, ExecutionContext,
    FixedScopeClassifier, Scope, ScopeClassifier, ServiceCatalog, ServiceKey, ServiceProvider,
    ServiceRegistration,
};
pub use lifecycle::{HostExit, Orchestrator, ScopeAwareHost, StartupState};
pub use provider::{ProviderError, SingletonProvider};
