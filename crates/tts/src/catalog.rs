use std::sync::Arc;

use indexmap::IndexSet;
use vocalis_config::ModelsConfig;

use crate::{engine::EngineLoader, error::TtsError};

/// Lists the model identifiers clients may select
///
/// Configured models come first, followed by whatever the engine reports
/// under the configured prefix.
pub struct ModelCatalog {
    available: Vec<String>,
    prefix: String,
    loader: Arc<dyn EngineLoader>,
}

impl ModelCatalog {
    pub fn new(config: &ModelsConfig, loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            available: config.available.clone(),
            prefix: config.prefix.clone(),
            loader,
        }
    }

    pub async fn list(&self) -> crate::Result<Vec<String>> {
        let discovered = self.loader.discover_models().await.map_err(|e| {
            tracing::error!("model discovery failed: {e:#}");
            TtsError::Engine(format!("Failed to list models: {e:#}"))
        })?;

        let models: IndexSet<String> = self
            .available
            .iter()
            .cloned()
            .chain(discovered.into_iter().filter(|id| id.starts_with(&self.prefix)))
            .collect();

        Ok(models.into_iter().collect())
    }
}
