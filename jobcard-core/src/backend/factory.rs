use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::repository::{BackendError, JobCardBackend};

/// Which backend to open, as read from the `[backend]` config table.
///
/// `backend` names a registered [`BackendFactory`]; `connection_string` is
/// handed to that factory as is.
///
/// | backend    | connection_string examples                  |
/// |------------|---------------------------------------------|
/// | `memory`   | `""`, `seeds/options.csv`                   |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    /// Registered backend name, e.g. `"memory"`.
    #[serde(rename = "name")]
    pub backend: String,
    /// Backend-specific; blank means the backend's own default.
    #[serde(rename = "connection", default)]
    pub connection_string: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

/// Opens one kind of backend. Backend crates export a unit struct
/// implementing this, which the binary registers at startup.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Name used in `BackendConfig::backend`.
    fn backend_name(&self) -> &'static str;

    /// Builds a backend ready for the form to use.
    async fn create(
        &self,
        config: &BackendConfig,
    ) -> Result<Box<dyn JobCardBackend>, BackendError>;
}

/// Backend factories by name. Filled once at startup, then asked for a
/// backend whenever a form is opened.
pub struct BackendRegistry {
    factories: HashMap<&'static str, Box<dyn BackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Adds `factory`, replacing any factory registered under the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn BackendFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the backend named by `config.backend`.
    ///
    /// # Errors
    /// [`BackendError::Configuration`] for an unregistered name, listing the
    /// registered ones; otherwise whatever the factory returns.
    pub async fn create(
        &self,
        config: &BackendConfig,
    ) -> Result<Box<dyn JobCardBackend>, BackendError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                BackendError::Configuration(format!(
                    "no backend named '{}' (registered: {})",
                    config.backend,
                    self.available_backends().join(", ")
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
