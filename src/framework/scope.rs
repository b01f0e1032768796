//! # Scopes & Execution Contexts
//!
//! An application built on this crate may run the same service catalog in several
//! execution contexts: the primary UI context ([`ExecutionContext::Window`]) and
//! worker-like background contexts. A [`Scope`] says in which of those contexts a
//! service should auto-start.
//!
//! The [`ScopeClassifier`] trait is the seam to the host environment: it reports the
//! context the process is running in. [`FixedScopeClassifier`] is the implementation used
//! when the host knows its context up front (from configuration or the environment).

use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::framework::error::UnknownContext;

/// Where a service should auto-start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Never auto-start.
    None,
    /// Primary UI context only.
    Window,
    DedicatedWorker,
    SharedWorker,
    ServiceWorker,
    /// Every context.
    All,
    /// Defer to capabilities: background services resolve to `All`, others to `None`.
    Default,
}

impl Scope {
    /// Resolves `Default` against the implementation's background capability.
    pub fn resolve(self, background_capable: bool) -> Scope {
        match self {
            Scope::Default if background_capable => Scope::All,
            Scope::Default => Scope::None,
            other => other,
        }
    }

    /// True if a service with this scope belongs in `context`.
    ///
    /// `Default` is unresolved and never matches.
    pub fn includes(self, context: ExecutionContext) -> bool {
        match self {
            Scope::None | Scope::Default => false,
            Scope::All => true,
            Scope::Window => context == ExecutionContext::Window,
            Scope::DedicatedWorker => context == ExecutionContext::DedicatedWorker,
            Scope::SharedWorker => context == ExecutionContext::SharedWorker,
            Scope::ServiceWorker => context == ExecutionContext::ServiceWorker,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::None => "none",
            Scope::Window => "window",
            Scope::DedicatedWorker => "dedicated-worker",
            Scope::SharedWorker => "shared-worker",
            Scope::ServiceWorker => "service-worker",
            Scope::All => "all",
            Scope::Default => "default",
        };
        f.write_str(name)
    }
}

/// The execution context a process is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionContext {
    Window,
    DedicatedWorker,
    SharedWorker,
    ServiceWorker,
}

impl ExecutionContext {
    /// Every context other than `Window` is a background context.
    pub fn is_background(self) -> bool {
        self != ExecutionContext::Window
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionContext::Window => "window",
            ExecutionContext::DedicatedWorker => "dedicated-worker",
            ExecutionContext::SharedWorker => "shared-worker",
            ExecutionContext::ServiceWorker => "service-worker",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionContext {
    type Err = UnknownContext;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "window" => Ok(ExecutionContext::Window),
            "dedicated-worker" => Ok(ExecutionContext::DedicatedWorker),
            "shared-worker" => Ok(ExecutionContext::SharedWorker),
            "service-worker" => Ok(ExecutionContext::ServiceWorker),
            _ => Err(UnknownContext(s.to_string())),
        }
    }
}

macro_rules! context_predicates {
    ($($variant:ident => $name:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "True when running in the `" $variant "` context."]
                fn [<is_ $name>](&self) -> bool {
                    self.current() == ExecutionContext::$variant
                }
            )*
        }
    };
}

/// Reports which execution context the process is running in.
pub trait ScopeClassifier: Send + Sync {
    fn current(&self) -> ExecutionContext;

    /// True if the current context satisfies `scope`. `All` always matches, `None` never does.
    fn matches(&self, scope: Scope) -> bool {
        scope.includes(self.current())
    }

    /// True in any background context.
    fn is_worker(&self) -> bool {
        self.current().is_background()
    }

    context_predicates! {
        Window => window,
        DedicatedWorker => dedicated_worker,
        SharedWorker => shared_worker,
        ServiceWorker => service_worker,
    }
}

/// A classifier whose context is decided once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedScopeClassifier {
    context: ExecutionContext,
}

impl FixedScopeClassifier {
    /// Environment variable consulted by [`FixedScopeClassifier::from_env`].
    pub const ENV_VAR: &'static str = "SCOPE_ACTIVATION_CONTEXT";

    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// Reads the context from `SCOPE_ACTIVATION_CONTEXT`, falling back to `Window` when unset.
    pub fn from_env() -> Result<Self, UnknownContext> {
        Self::from_var(std::env::var(Self::ENV_VAR))
    }

    /// Only a missing variable falls back to `Window`; a value that is not valid
    /// Unicode is rejected like any other unknown name.
    fn from_var(value: Result<String, VarError>) -> Result<Self, UnknownContext> {
        match value {
            Ok(value) => Ok(Self::new(value.parse()?)),
            Err(VarError::NotPresent) => Ok(Self::new(ExecutionContext::Window)),
            Err(VarError::NotUnicode(raw)) => {
                Err(UnknownContext(raw.to_string_lossy().into_owned()))
            }
        }
    }
}

impl ScopeClassifier for FixedScopeClassifier {
    fn current(&self) -> ExecutionContext {
        self.context
    }
}
