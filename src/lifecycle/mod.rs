//! # Lifecycle
//!
//! Everything that decides *when* a service starts.
//!
//! - [`ScopeLedger`] - Desired auto-start scope per service, written once per key
//! - [`ActivationTable`] / [`ActivationRecord`] - Per-service activation state
//! - [`Orchestrator`] - Bulk and on-demand activation
//! - [`ScopeAwareHost`] - Runs the application in the window context, parks workers
//! - [`tracing`] - Log setup

pub mod activation;
pub mod host;
pub mod ledger;
pub mod orchestrator;
pub mod tracing;

pub use activation::{ActivationRecord, ActivationTable, StartupState};
pub use host::{HostExit, ScopeAwareHost};
pub use ledger::ScopeLedger;
pub use orchestrator::Orchestrator;
