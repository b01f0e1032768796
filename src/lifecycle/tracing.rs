//! # Observability & Tracing
//!
//! Tracing setup for hosts built on the orchestrator.
//!
//! ## Overview
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//! Every activation step logs the service it concerns as a structured `service` field, so
//! a dependency chain can be followed by filtering on a single service name.
//!
//! ## Configuration
//!
//! The compact format hides the crate/module prefix (`with_target(false)`); the
//! `service`, `scope` and `order` fields carry the context instead.
//!
//! - **Configurable log levels** via the `RUST_LOG` environment variable
//! - **Spans** on the public entry points (`run_bulk_activation`, `activate`,
//!   `find_by_capability`, `ScopeAwareHost::run`)
//!
//! ## What Gets Traced
//!
//! - **Ledger**: Scope declarations, and late declarations that no longer take effect
//! - **Table**: One line per tracked service with its resolved scope and initial state
//! - **Activation**: Dependencies pulled in, services started with their order, async
//!   initializers invoked
//! - **Errors**: The failing service and the collaborator's error
//!
//! ## Usage Examples
//!
//! ```bash
//! # Milestones only
//! RUST_LOG=info cargo run
//!
//! # Every state transition
//! RUST_LOG=debug cargo run
//!
//! # Run as a worker
//! SCOPE_ACTIVATION_CONTEXT=dedicated-worker RUST_LOG=info cargo run
//! ```
//!
//! ## Activation Trace Example
//!
//! **With `RUST_LOG=info`** in the window context:
//!
//! ```text
//! INFO run_bulk_activation: Bulk activation started context=window services=3
//! INFO run_bulk_activation: Service started context=window service=Clock order=Some(0)
//! INFO run_bulk_activation: Running async initializer context=window service=Clock
//! INFO run_bulk_activation: Service started context=window service=Telemetry order=Some(1)
//! INFO run_bulk_activation: Bulk activation complete context=window started=2
//! ```
//!
//! `Clock` starts before `Telemetry` because `Telemetry` depends on it; the worker-only
//! `Indexer` is tracked but not started.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Module paths add nothing; the service field identifies the source
        .compact()
        .init();
}
