use std::sync::Arc;

use anyhow::{Context, Result};
use jobcard_core::{BackendConfig, BackendRegistry, JobCardBackend};
use jobcard_memory::MemoryBackendFactory;
use tracing::debug;

/// Registry with every backend this binary ships.
pub fn build_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(Box::new(MemoryBackendFactory));
    registry
}

/// Opens the backend named in `config`.
pub async fn open_backend(config: &BackendConfig) -> Result<Arc<dyn JobCardBackend>> {
    debug!(backend = %config.backend, "opening backend");
    let backend = build_registry()
        .create(config)
        .await
        .with_context(|| format!("cannot open '{}' backend", config.backend))?;
    Ok(Arc::from(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_is_registered() {
        assert_eq!(build_registry().available_backends(), vec!["memory"]);
    }

    #[tokio::test]
    async fn unknown_backend_is_reported() {
        let config = BackendConfig {
            backend: "rest".to_string(),
            connection_string: String::new(),
        };

        let message = match open_backend(&config).await {
            Err(e) => format!("{e:#}"),
            Ok(_) => panic!("expected an error"),
        };

        assert!(message.contains("rest"), "got: {message}");
    }
}
