//! Active model ownership and hot swapping
//!
//! The manager holds at most one [`ModelHandle`]. Readers clone the `Arc`
//! and keep using that handle for the rest of their request, so a reload
//! never changes the model under an in-flight synthesis. Loads are
//! serialized, and the slot is only written after a load fully succeeds.

use std::sync::Arc;

use indexmap::IndexSet;
use tokio::sync::{Mutex, RwLock};

use crate::{
    engine::{EngineLoader, SpeechEngine},
    error::TtsError,
};

/// What optional parameters a model accepts
///
/// Computed once when the model is loaded. A model that exposes no
/// listing, or an empty one, declares no support.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub supports_speakers: bool,
    pub known_speakers: IndexSet<String>,
    pub supports_languages: bool,
    pub known_languages: IndexSet<String>,
}

impl Capabilities {
    pub fn from_listings(speakers: Option<Vec<String>>, languages: Option<Vec<String>>) -> Self {
        let known_speakers: IndexSet<String> = speakers.unwrap_or_default().into_iter().collect();
        let known_languages: IndexSet<String> = languages.unwrap_or_default().into_iter().collect();

        Self {
            supports_speakers: !known_speakers.is_empty(),
            known_speakers,
            supports_languages: !known_languages.is_empty(),
            known_languages,
        }
    }

    /// Introspect an engine instance
    pub fn probe(engine: &dyn SpeechEngine) -> Self {
        Self::from_listings(engine.speakers(), engine.languages())
    }
}

/// A loaded engine together with its identifier and capabilities
pub struct ModelHandle {
    id: String,
    engine: Box<dyn SpeechEngine>,
    capabilities: Capabilities,
}

impl ModelHandle {
    pub fn new(id: impl Into<String>, engine: Box<dyn SpeechEngine>) -> Self {
        let capabilities = Capabilities::probe(engine.as_ref());

        Self {
            id: id.into(),
            engine,
            capabilities,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn engine(&self) -> &dyn SpeechEngine {
        self.engine.as_ref()
    }

    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        tracing::debug!(model = %self.id, "model released");
    }
}

/// Owner of the process-wide active model
pub struct ModelManager {
    loader: Arc<dyn EngineLoader>,
    active: RwLock<Option<Arc<ModelHandle>>>,
    reload: Mutex<()>,
}

impl ModelManager {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            active: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    /// Currently active model, if any
    pub async fn active(&self) -> Option<Arc<ModelHandle>> {
        self.active.read().await.clone()
    }

    /// Load `model` and make it the active model
    ///
    /// On failure the previously active model, if any, stays active.
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::Validation`] for a blank identifier and
    /// [`TtsError::ModelLoadFailed`] when the engine cannot load it
    pub async fn load_model(&self, model: &str) -> crate::Result<Arc<ModelHandle>> {
        let model = model.trim();
        if model.is_empty() {
            return Err(TtsError::Validation("No model name provided".to_string()));
        }

        let _serialized = self.reload.lock().await;

        tracing::info!(model, "loading model");

        let engine = self.loader.load(model).await.map_err(|e| {
            tracing::error!(model, "failed to load model: {e:#}");
            TtsError::ModelLoadFailed {
                model: model.to_string(),
                message: format!("{e:#}"),
            }
        })?;

        let handle = Arc::new(ModelHandle::new(model, engine));

        tracing::info!(
            model,
            speakers = handle.capabilities.known_speakers.len(),
            languages = handle.capabilities.known_languages.len(),
            "model loaded"
        );

        let previous = self.active.write().await.replace(Arc::clone(&handle));
        drop(previous);

        Ok(handle)
    }
}
