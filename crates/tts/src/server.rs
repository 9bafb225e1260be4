use std::{path::PathBuf, sync::Arc};

use indexmap::IndexMap;
use vocalis_config::Config;

use crate::{
    catalog::ModelCatalog,
    engine::{CommandEngineLoader, EngineLoader},
    error::TtsError,
    ingest::{CANONICAL_EXTENSION, ReferenceIngestor},
    ledger::TempLedger,
    model::ModelManager,
    types::{AudioResult, ModelSelected, StatusResponse, SynthesisRequest},
};

/// Endpoint names and paths advertised by the status route
pub(crate) const ENDPOINTS: &[(&str, &str)] = &[
    ("synthesize", "/synthesize"),
    ("models", "/models"),
    ("speakers", "/speakers"),
    ("languages", "/languages"),
    ("model", "/model"),
    ("status", "/"),
];

/// Synthesis pipeline shared by all request handlers
pub struct Server {
    models: ModelManager,
    catalog: ModelCatalog,
    ingestor: ReferenceIngestor,
    temp_dir: PathBuf,
}

impl Server {
    /// Run one synthesis request end to end
    ///
    /// Every temporary file created on the way is deleted before this
    /// returns, whether synthesis succeeded or not.
    pub async fn synthesize(&self, request: SynthesisRequest) -> crate::Result<AudioResult> {
        let mut ledger = TempLedger::new(&self.temp_dir);

        let result = self.run(request, &mut ledger).await;
        ledger.close().await;

        result
    }

    async fn run(&self, request: SynthesisRequest, ledger: &mut TempLedger) -> crate::Result<AudioResult> {
        let mut job = request.fields.resolve()?;

        tracing::info!(
            text_length = job.text.chars().count(),
            language = %job.language_id,
            reference = request.reference.is_some(),
            "synthesis started"
        );

        if let Some(upload) = &request.reference {
            job.reference_audio = Some(self.ingestor.ingest(upload, ledger).await?);
        }

        let model = self.models.active().await.ok_or(TtsError::NoModelLoaded)?;

        let output = ledger.allocate(CANONICAL_EXTENSION);
        let output = ledger.path(output).to_path_buf();

        let invocation = job.finalize(model.capabilities(), &output);

        if let Err(e) = model.engine().synthesize(&invocation).await {
            tracing::error!(model = model.id(), "synthesis failed: {e}");
            return Err(e);
        }

        let audio = match tokio::fs::read(&output).await {
            Ok(audio) => audio,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(TtsError::internal("failed to read synthesized audio", e)),
        };

        if audio.is_empty() {
            tracing::error!(model = model.id(), "engine produced no audio");
            return Err(TtsError::Engine("Engine produced no audio".to_string()));
        }

        tracing::debug!(model = model.id(), bytes = audio.len(), "synthesis complete");

        Ok(AudioResult::wav(audio))
    }

    /// Load a model and make it active
    pub async fn load_model(&self, model: &str) -> crate::Result<ModelSelected> {
        let handle = self.models.load_model(model).await?;

        Ok(ModelSelected {
            status: "success".to_string(),
            model: handle.id().to_string(),
        })
    }

    /// Identifier of the active model
    pub async fn active_model(&self) -> Option<String> {
        self.models.active().await.map(|handle| handle.id().to_string())
    }

    /// Speakers declared by the active model, empty without a model
    pub async fn speakers(&self) -> Vec<String> {
        self.models
            .active()
            .await
            .map(|handle| handle.capabilities().known_speakers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Languages declared by the active model, empty without a model
    pub async fn languages(&self) -> Vec<String> {
        self.models
            .active()
            .await
            .map(|handle| handle.capabilities().known_languages.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn models(&self) -> crate::Result<Vec<String>> {
        self.catalog.list().await
    }

    pub async fn status(&self) -> StatusResponse {
        StatusResponse {
            status: "running".to_string(),
            model: self.active_model().await,
            endpoints: ENDPOINTS
                .iter()
                .map(|(name, path)| ((*name).to_string(), (*path).to_string()))
                .collect::<IndexMap<_, _>>(),
        }
    }
}

/// Builder for constructing the synthesis server from configuration
pub struct TtsServerBuilder<'a> {
    config: &'a Config,
    loader: Option<Arc<dyn EngineLoader>>,
}

impl<'a> TtsServerBuilder<'a> {
    pub const fn new(config: &'a Config) -> Self {
        Self { config, loader: None }
    }

    /// Use `loader` instead of the configured engine command
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn EngineLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn build(self) -> crate::Result<Server> {
        let temp_dir = self.config.storage.temp_dir();

        std::fs::create_dir_all(&temp_dir).map_err(|e| {
            TtsError::InternalError(Some(format!(
                "failed to create temporary directory {}: {e}",
                temp_dir.display()
            )))
        })?;

        let loader: Arc<dyn EngineLoader> = match self.loader {
            Some(loader) => loader,
            None => {
                tracing::debug!(command = %self.config.engine.command, "using command engine");

                Arc::new(CommandEngineLoader::new(
                    self.config.engine.clone(),
                    self.config.models.list_args.clone(),
                ))
            }
        };

        tracing::debug!(temp_dir = %temp_dir.display(), "synthesis server initialized");

        Ok(Server {
            models: ModelManager::new(Arc::clone(&loader)),
            catalog: ModelCatalog::new(&self.config.models, loader),
            ingestor: ReferenceIngestor::new(self.config.transcoder.clone()),
            temp_dir,
        })
    }
}
