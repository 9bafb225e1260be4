//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use vocalis_config::{Config, CorsConfig};

/// Model every test server loads at startup unless told otherwise
pub const DEFAULT_MODEL: &str = "tts_models/en/ljspeech/tacotron2-DDC";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration writing scratch files into `temp_dir`
    pub fn new(temp_dir: &Path) -> Self {
        let mut config = Config::default();

        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.storage.temp_dir = Some(temp_dir.to_path_buf());
        config.models.default_model = Some(DEFAULT_MODEL.to_string());
        config.models.available = vec![DEFAULT_MODEL.to_string()];
        config.transcoder.command = temp_dir.join("no-such-ffmpeg").to_string_lossy().into_owned();

        Self { config }
    }

    /// Model loaded at startup, or none
    pub fn with_default_model(mut self, model: Option<&str>) -> Self {
        self.config.models.default_model = model.map(str::to_string);
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
