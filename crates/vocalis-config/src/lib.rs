#![allow(clippy::must_use_candidate)]

pub mod cors;
pub mod engine;
mod env;
pub mod health;
mod loader;
pub mod models;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod transcoder;

use serde::Deserialize;

pub use cors::*;
pub use engine::*;
pub use health::*;
pub use models::*;
pub use server::*;
pub use storage::*;
pub use telemetry::*;
pub use transcoder::*;

/// Top-level Vocalis configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Model catalog and startup model
    #[serde(default)]
    pub models: ModelsConfig,
    /// External synthesis engine command
    #[serde(default)]
    pub engine: EngineConfig,
    /// External audio transcoder used for reference recordings
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    /// Scratch storage for per-request temporary files
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
