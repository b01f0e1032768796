//! Registration ledger: the desired auto-start scope per service key.

use std::collections::HashMap;

use crate::framework::{ActivationError, Scope, ServiceKey};

/// Write-once-per-key table of scope declarations.
#[derive(Debug, Default, Clone)]
pub struct ScopeLedger {
    scopes: HashMap<ServiceKey, Scope>,
}

impl ScopeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the scope for `key`. A second declaration for the same key is a
    /// configuration error and leaves the first one in place.
    pub fn declare(&mut self, key: ServiceKey, scope: Scope) -> Result<(), ActivationError> {
        if self.scopes.contains_key(&key) {
            return Err(ActivationError::DuplicateScope { service: key });
        }
        self.scopes.insert(key, scope);
        Ok(())
    }

    pub fn get(&self, key: &ServiceKey) -> Option<Scope> {
        self.scopes.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
