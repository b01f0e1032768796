//! # Activation Errors
//!
//! This module defines the error types shared by the orchestrator and its
//! collaborators. Collaborators (providers, async initializers) report failures
//! as a boxed [`BoxError`]; the orchestrator wraps them with the key of the
//! service that failed so the caller can tell which link of a dependency chain broke.

use crate::framework::service::ServiceKey;

/// Boxed error type used at collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while declaring scopes or activating services.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    /// A scope was declared twice for the same service. Not recoverable.
    #[error("Scope already declared for service: {service}")]
    DuplicateScope { service: ServiceKey },

    /// The provider could not build the service instance.
    #[error("Failed to materialize service {service}: {source}")]
    Materialize {
        service: ServiceKey,
        #[source]
        source: BoxError,
    },

    /// The service's async initializer returned an error. It is never retried.
    #[error("Async initializer failed for service {service}: {source}")]
    Initializer {
        service: ServiceKey,
        #[source]
        source: BoxError,
    },

    /// A typed lookup found the service but the instance has a different type.
    #[error("Service {service} is not a {expected}")]
    TypeMismatch {
        service: ServiceKey,
        expected: &'static str,
    },
}

/// An execution context name that does not match any known context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown execution context: {0}")]
pub struct UnknownContext(pub String);
