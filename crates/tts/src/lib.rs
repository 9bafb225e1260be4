#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod catalog;
mod engine;
mod error;
mod ingest;
mod ledger;
mod model;
mod request;
mod resolver;
mod server;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};

pub use catalog::ModelCatalog;
pub use engine::{CommandEngineLoader, EngineInvocation, EngineLoader, SpeechEngine};
pub use error::{Result, TtsError};
pub use ingest::ReferenceIngestor;
pub use ledger::{ResourceHandle, TempLedger};
pub use model::{Capabilities, ModelHandle, ModelManager};
pub use request::{ExtractJson, ExtractSynthesis, JSON_BODY_LIMIT_BYTES, MULTIPART_BODY_LIMIT_BYTES};
pub use resolver::{DEFAULT_LANGUAGE, DEFAULT_SPEED, RawFields, SynthesisJob};
pub use server::{Server, TtsServerBuilder};
pub use types::{AudioResult, ModelSelected, ModelSelection, ReferenceUpload, StatusResponse, SynthesisRequest};

/// Build the synthesis server from configuration
pub fn build_server(config: &vocalis_config::Config) -> anyhow::Result<Arc<Server>> {
    build(TtsServerBuilder::new(config))
}

/// Build the synthesis server with a custom engine loader
pub fn build_server_with_loader(
    config: &vocalis_config::Config,
    loader: Arc<dyn EngineLoader>,
) -> anyhow::Result<Arc<Server>> {
    build(TtsServerBuilder::new(config).with_loader(loader))
}

fn build(builder: TtsServerBuilder<'_>) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize synthesis server: {}", e.client_message()))?,
    );
    Ok(server)
}

/// Load the startup model, if one is configured
///
/// A failure is logged and the server keeps running without a model.
pub async fn load_initial_model(server: &Server, model: Option<&str>) {
    let Some(model) = model.filter(|m| !m.trim().is_empty()) else {
        tracing::info!("no default model configured, waiting for POST /model");
        return;
    };

    if let Err(e) = server.load_model(model).await {
        tracing::error!("could not load default model, starting without one: {e}");
    }
}

/// Create the endpoint router for speech synthesis
pub fn endpoint_router() -> Router<Arc<Server>> {
    let synthesize_route = get(synthesize)
        .post(synthesize)
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT_BYTES));

    Router::new()
        .route("/", get(status))
        .route("/synthesize", synthesize_route.clone())
        .route("/models", get(list_models))
        .route("/speakers", get(list_speakers))
        .route("/languages", get(list_languages))
        .route("/model", post(select_model))
        .route("/api/tts", synthesize_route)
        .route("/api/models", get(list_models))
        .route("/api/speakers", get(list_speakers))
        .route("/api/languages", get(list_languages))
        .route("/api/model", post(select_model))
}

/// Handle speech synthesis requests
async fn synthesize(
    State(server): State<Arc<Server>>,
    ExtractSynthesis(request): ExtractSynthesis,
) -> Result<axum::response::Response> {
    let response = server.synthesize(request).await?;

    Ok(response.into_response())
}

async fn list_models(State(server): State<Arc<Server>>) -> Result<Json<Vec<String>>> {
    Ok(Json(server.models().await?))
}

async fn list_speakers(State(server): State<Arc<Server>>) -> Json<Vec<String>> {
    Json(server.speakers().await)
}

async fn list_languages(State(server): State<Arc<Server>>) -> Json<Vec<String>> {
    Json(server.languages().await)
}

async fn select_model(
    State(server): State<Arc<Server>>,
    ExtractJson(selection): ExtractJson<ModelSelection>,
) -> Result<Json<ModelSelected>> {
    let model = selection.model_name.unwrap_or_default();

    Ok(Json(server.load_model(&model).await?))
}

async fn status(State(server): State<Arc<Server>>) -> Json<StatusResponse> {
    Json(server.status().await)
}
