pub(crate) mod command;

use std::path::Path;

use async_trait::async_trait;

pub use command::CommandEngineLoader;

/// One fully resolved engine call
///
/// Optional parameters are already filtered against the model's
/// capabilities; an engine receives only what it declared it supports.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInvocation<'a> {
    pub text: &'a str,
    /// Where the engine must write its waveform
    pub output: &'a Path,
    /// Canonical reference recording for voice cloning
    pub reference_audio: Option<&'a Path>,
    pub speaker: Option<&'a str>,
    pub language: Option<&'a str>,
    /// `None` means the engine's default speed
    pub speed: Option<f32>,
}

/// A loaded synthesis engine instance
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Synthesize `invocation.text` into `invocation.output`
    ///
    /// Failures are reported as [`crate::TtsError::Engine`] with the engine's
    /// own message.
    async fn synthesize(&self, invocation: &EngineInvocation<'_>) -> crate::Result<()>;

    /// Speaker identifiers the model declares, if it exposes any
    fn speakers(&self) -> Option<Vec<String>> {
        None
    }

    /// Language identifiers the model declares, if it exposes any
    fn languages(&self) -> Option<Vec<String>> {
        None
    }
}

/// Constructs engine instances for model identifiers
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Load the model named `model`
    async fn load(&self, model: &str) -> anyhow::Result<Box<dyn SpeechEngine>>;

    /// Model identifiers the engine itself can report
    async fn discover_models(&self) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
