use std::fs::File;
use std::path::PathBuf;

use async_trait::async_trait;
use jobcard_core::backend::{BackendConfig, BackendFactory};
use jobcard_core::{BackendError, JobCardBackend};
use tracing::info;

use crate::repository::MemoryBackend;
use crate::seed::OptionSeedLoader;

/// Resolve the option seed file.
///
/// Resolution order:
/// 1. The connection string, when it is not blank.
/// 2. **`JOBCARD_OPTION_SEEDS`**, if set.
/// 3. No seed file: the backend starts with empty option lists.
fn seed_path(config: &BackendConfig) -> Option<PathBuf> {
    let connection = config.connection_string.trim();
    if !connection.is_empty() {
        return Some(PathBuf::from(connection));
    }
    std::env::var("JOBCARD_OPTION_SEEDS")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

/// [`BackendFactory`] for the in-memory backend.
///
/// ```rust,no_run
/// use jobcard_core::BackendRegistry;
/// use jobcard_memory::MemoryBackendFactory;
///
/// let mut registry = BackendRegistry::new();
/// registry.register(Box::new(MemoryBackendFactory));
/// ```
pub struct MemoryBackendFactory;

#[async_trait]
impl BackendFactory for MemoryBackendFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    /// Build an empty backend and load the option seed CSV, if one is named.
    async fn create(
        &self,
        config: &BackendConfig,
    ) -> Result<Box<dyn JobCardBackend>, BackendError> {
        let backend = MemoryBackend::new();

        if let Some(path) = seed_path(config) {
            let file = File::open(&path).map_err(|e| {
                BackendError::Configuration(format!(
                    "cannot open option seeds '{}': {e}",
                    path.display()
                ))
            })?;
            let records = OptionSeedLoader::parse(file)
                .map_err(|e| BackendError::Configuration(e.to_string()))?;
            let count = OptionSeedLoader::load(&backend, &records)
                .map_err(|e| BackendError::Configuration(e.to_string()))?;
            info!(path = %path.display(), count, "option seeds loaded");
        }

        Ok(Box::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use jobcard_core::CascadeLevel;

    use super::*;

    fn config(connection: &str) -> BackendConfig {
        BackendConfig {
            backend: "memory".to_string(),
            connection_string: connection.to_string(),
        }
    }

    #[test]
    fn backend_name_is_memory() {
        assert_eq!(MemoryBackendFactory.backend_name(), "memory");
    }

    #[test]
    fn connection_string_names_seed_file() {
        assert_eq!(
            seed_path(&config(" seeds/options.csv ")),
            Some(PathBuf::from("seeds/options.csv"))
        );
    }

    #[tokio::test]
    async fn creates_backend_from_seed_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/options.csv");

        let backend = MemoryBackendFactory
            .create(&config(path))
            .await
            .expect("seeded backend");

        let customers = backend.fetch_options(CascadeLevel::Customer, None).await.unwrap();
        assert!(!customers.is_empty());
    }

    #[tokio::test]
    async fn missing_seed_file_is_a_configuration_error() {
        let result = MemoryBackendFactory
            .create(&config("/nonexistent/options.csv"))
            .await;

        match result {
            Err(BackendError::Configuration(msg)) => {
                assert!(msg.contains("/nonexistent/options.csv"), "got: {msg}")
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a backend"),
        }
    }
}
