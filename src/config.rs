//! # Activation Manifest
//!
//! Optional TOML file that lets a deployment pin the execution context and add scope
//! declarations without touching the composition root:
//!
//! ```toml
//! context = "dedicated-worker"
//!
//! [scopes]
//! Clock = "all"
//! "my_app::Telemetry" = "window"
//! ```
//!
//! Service names are matched against the catalog by full type name or by short name.
//! Declarations from the manifest go through the same write-once ledger as registration
//! scopes, so a service cannot be scoped in both places.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::framework::{
    ActivationError, ExecutionContext, FixedScopeClassifier, Scope, ServiceCatalog, ServiceKey,
    UnknownContext,
};
use crate::lifecycle::Orchestrator;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("No registered service named {0}")]
    UnknownService(String),

    #[error("Service name {name} matches more than one registration: {candidates}")]
    AmbiguousService { name: String, candidates: String },

    #[error(transparent)]
    UnknownContext(#[from] UnknownContext),

    #[error(transparent)]
    Activation(#[from] ActivationError),
}

/// Parsed activation manifest. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivationConfig {
    /// Forces the execution context instead of reading it from the environment.
    pub context: Option<ExecutionContext>,
    /// Scope per service name.
    pub scopes: BTreeMap<String, Scope>,
}

impl ActivationConfig {
    /// Load the manifest from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::load_str(&content)?;
        debug!(path = %path.display(), scopes = config.scopes.len(), "Activation manifest loaded");
        Ok(config)
    }

    /// Load the manifest from a string.
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Classifier for this process: the manifest's context, else
    /// `SCOPE_ACTIVATION_CONTEXT`, else the window context.
    pub fn classifier(&self) -> Result<FixedScopeClassifier, ConfigError> {
        match self.context {
            Some(context) => Ok(FixedScopeClassifier::new(context)),
            None => Ok(FixedScopeClassifier::from_env()?),
        }
    }

    /// Declares every manifest scope on `orchestrator`.
    ///
    /// All names are resolved before anything is declared, so an unknown name leaves the
    /// ledger untouched.
    pub fn apply(&self, orchestrator: &Orchestrator) -> Result<(), ConfigError> {
        let resolved = self
            .scopes
            .iter()
            .map(|(name, scope)| Ok((resolve_name(orchestrator.catalog(), name)?, *scope)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        for (key, scope) in resolved {
            orchestrator.declare_scope(key, scope)?;
        }
        info!(declared = self.scopes.len(), "Manifest scopes applied");
        Ok(())
    }
}

/// Full type names win over short names; a short name must be unambiguous.
fn resolve_name(catalog: &ServiceCatalog, name: &str) -> Result<ServiceKey, ConfigError> {
    if let Some(registration) = catalog.iter().find(|r| r.key().type_name() == name) {
        return Ok(registration.key());
    }

    let mut candidates: Vec<ServiceKey> = Vec::new();
    for key in catalog.iter().map(|r| r.key()) {
        if key.short_name() == name && !candidates.contains(&key) {
            candidates.push(key);
        }
    }
    match candidates.as_slice() {
        [] => Err(ConfigError::UnknownService(name.to_string())),
        [key] => Ok(*key),
        _ => Err(ConfigError::AmbiguousService {
            name: name.to_string(),
            candidates: candidates
                .iter()
                .map(|k| k.type_name())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockProvider;
    use crate::framework::{ScopeClassifier, ServiceRegistration};
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    struct Clock;
    struct Telemetry;

    mod other {
        pub struct Clock;
    }

    fn orchestrator(catalog: ServiceCatalog) -> Orchestrator {
        Orchestrator::new(
            catalog,
            Arc::new(MockProvider::new()),
            Arc::new(FixedScopeClassifier::new(ExecutionContext::Window)),
        )
        .unwrap()
    }

    #[test]
    fn test_load_empty_config() {
        let config = ActivationConfig::load_str("").unwrap();
        assert_eq!(config, ActivationConfig::default());
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            context = "shared-worker"

            [scopes]
            Clock = "all"
            "app::Telemetry" = "window"
        "#;
        let config = ActivationConfig::load_str(content).unwrap();
        assert_eq!(config.context, Some(ExecutionContext::SharedWorker));
        assert_eq!(config.scopes.get("Clock"), Some(&Scope::All));
        assert_eq!(config.scopes.get("app::Telemetry"), Some(&Scope::Window));

        let classifier = config.classifier().unwrap();
        assert!(classifier.is_shared_worker());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scopes]").unwrap();
        writeln!(file, "Telemetry = \"dedicated-worker\"").unwrap();

        let config = ActivationConfig::load(file.path()).unwrap();
        assert_eq!(config.scopes.len(), 1);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ActivationConfig::load(Path::new("/nonexistent/path/activation.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(matches!(
            ActivationConfig::load_str("context = \"tab\""),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            ActivationConfig::load_str("[scopes]\nClock = \"sometimes\""),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            ActivationConfig::load_str("workers = 2"),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_apply_by_short_and_full_name() {
        let orchestrator = orchestrator(
            ServiceCatalog::new()
                .add(ServiceRegistration::of::<Clock>())
                .add(ServiceRegistration::of::<Telemetry>()),
        );
        let mut config = ActivationConfig::default();
        config.scopes.insert("Clock".into(), Scope::All);
        config.scopes.insert(
            std::any::type_name::<Telemetry>().to_string(),
            Scope::DedicatedWorker,
        );

        config.apply(&orchestrator).unwrap();

        let err = orchestrator
            .declare_scope(ServiceKey::of::<Clock>(), Scope::Window)
            .unwrap_err();
        assert!(matches!(err, ActivationError::DuplicateScope { .. }));
    }

    #[tokio::test]
    async fn test_applied_scopes_drive_activation() {
        let orchestrator = orchestrator(
            ServiceCatalog::new()
                .add(ServiceRegistration::of::<Clock>())
                .add(ServiceRegistration::of::<Telemetry>()),
        );
        let config = ActivationConfig::load_str("[scopes]\nClock = \"window\"").unwrap();
        config.apply(&orchestrator).unwrap();

        orchestrator.run_bulk_activation().await.unwrap();
        assert_eq!(orchestrator.started_in_order(), vec![ServiceKey::of::<Clock>()]);
    }

    #[test]
    fn test_unknown_name_declares_nothing() {
        let orchestrator = orchestrator(ServiceCatalog::new().add(ServiceRegistration::of::<Clock>()));
        let config =
            ActivationConfig::load_str("[scopes]\nClock = \"all\"\nPrinter = \"all\"").unwrap();

        let err = config.apply(&orchestrator).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownService(ref name) if name == "Printer"));
        orchestrator
            .declare_scope(ServiceKey::of::<Clock>(), Scope::Window)
            .unwrap();
    }

    #[test]
    fn test_ambiguous_short_name() {
        let orchestrator = orchestrator(
            ServiceCatalog::new()
                .add(ServiceRegistration::of::<Clock>())
                .add(ServiceRegistration::of::<other::Clock>()),
        );
        let config = ActivationConfig::load_str("[scopes]\nClock = \"all\"").unwrap();

        let err = config.apply(&orchestrator).unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousService { .. }));
    }

    #[test]
    fn test_conflict_with_registration_scope() {
        let orchestrator = orchestrator(
            ServiceCatalog::new().add(ServiceRegistration::of::<Clock>().scope(Scope::Window)),
        );
        let config = ActivationConfig::load_str("[scopes]\nClock = \"all\"").unwrap();

        let err = config.apply(&orchestrator).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Activation(ActivationError::DuplicateScope { .. })
        ));
    }
}
