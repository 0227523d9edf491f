use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::HealthProbe;

/// Registration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Probe names are report keys and must be non-empty
    #[error("health probe name must not be empty")]
    EmptyName,

    /// A probe with this name is already registered
    #[error("health probe `{0}` is already registered")]
    Duplicate(String),
}

/// Named set of health probes, assembled once at startup
///
/// Names become the keys of the report's `services` map and are kept sorted.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    probes: BTreeMap<String, Arc<dyn HealthProbe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe under a unique name
    pub fn register(&mut self, name: impl Into<String>, probe: impl HealthProbe + 'static) -> Result<(), RegistryError> {
        self.register_shared(name, Arc::new(probe))
    }

    /// Register an already shared probe under a unique name
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<(), RegistryError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        if self.probes.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        self.probes.insert(name, probe);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Registered probe names in report order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.keys().map(String::as_str)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &dyn HealthProbe)> {
        self.probes.iter().map(|(name, probe)| (name.as_str(), probe.as_ref()))
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.probes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ServiceStatus, StaticProbe};

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = ProbeRegistry::new();
        registry.register("db", StaticProbe(ServiceStatus::Ok)).unwrap();

        let err = registry.register("db", StaticProbe(ServiceStatus::Ok)).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("db".to_owned()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_empty_names() {
        let mut registry = ProbeRegistry::new();
        let err = registry.register(" ", StaticProbe(ServiceStatus::Ok)).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = ProbeRegistry::new();
        for name in ["queue", "db", "cache"] {
            registry.register(name, StaticProbe(ServiceStatus::Ok)).unwrap();
        }

        assert_eq!(registry.names().collect::<Vec<_>>(), ["cache", "db", "queue"]);
    }
}
