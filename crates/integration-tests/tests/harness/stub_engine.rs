//! In-process engine that records what it was asked to synthesize
//!
//! Model identifiers select behaviour: ids containing `vctk` declare
//! speakers, `multilingual` declares languages, and ids starting with
//! `broken` fail to load. The text `explode` makes synthesis fail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tts::{EngineInvocation, EngineLoader, SpeechEngine, TtsError};

/// Owned copy of one engine call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub text: String,
    pub speaker: Option<String>,
    pub language: Option<String>,
    pub speed: Option<f32>,
    pub reference: Option<Vec<u8>>,
}

#[derive(Default)]
pub struct StubEngineLoader {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl StubEngineLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EngineLoader for StubEngineLoader {
    async fn load(&self, model: &str) -> anyhow::Result<Box<dyn SpeechEngine>> {
        if model.starts_with("broken") {
            anyhow::bail!("model checkpoint for '{model}' is corrupt");
        }

        Ok(Box::new(StubEngine {
            model: model.to_string(),
            calls: Arc::clone(&self.calls),
        }))
    }

    async fn discover_models(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec![
            "tts_models/en/vctk/vits".to_string(),
            "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
            "vocoder_models/en/ljspeech/hifigan_v2".to_string(),
        ])
    }
}

struct StubEngine {
    model: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[async_trait]
impl SpeechEngine for StubEngine {
    async fn synthesize(&self, invocation: &EngineInvocation<'_>) -> tts::Result<()> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: self.model.clone(),
            text: invocation.text.to_string(),
            speaker: invocation.speaker.map(str::to_string),
            language: invocation.language.map(str::to_string),
            speed: invocation.speed,
            reference: invocation.reference_audio.map(|path| std::fs::read(path).unwrap()),
        });

        if invocation.text == "explode" {
            return Err(TtsError::Engine("Kernel size can't be greater than actual input size".to_string()));
        }

        let mut audio = b"RIFF\0\0\0\0WAVE".to_vec();
        audio.extend_from_slice(invocation.text.as_bytes());
        std::fs::write(invocation.output, audio).unwrap();

        Ok(())
    }

    fn speakers(&self) -> Option<Vec<String>> {
        self.model
            .contains("vctk")
            .then(|| vec!["p225".to_string(), "p226".to_string()])
    }

    fn languages(&self) -> Option<Vec<String>> {
        self.model
            .contains("multilingual")
            .then(|| vec!["en".to_string(), "es".to_string(), "fr".to_string()])
    }
}

/// Number of entries left in a scratch directory
pub fn leftover_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
