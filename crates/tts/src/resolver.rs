//! Turning transport fields into a canonical synthesis job
//!
//! All three transports (query string, JSON body, multipart form) decode
//! into [`RawFields`]. From there a single code path validates, applies
//! defaults and, once the active model is known, drops the optional
//! parameters the model does not support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::{engine::EngineInvocation, error::TtsError, model::Capabilities};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SPEED: f32 = 1.0;

/// Request fields as received, before any validation
///
/// Accepts both camelCase and snake_case names. `speed` may arrive as a
/// string or, in JSON, as a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, rename = "speakerId", alias = "speaker_id", deserialize_with = "lenient_string")]
    pub speaker_id: Option<String>,
    #[serde(default, rename = "languageId", alias = "language_id", deserialize_with = "lenient_string")]
    pub language_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub speed: Option<String>,
}

/// Canonical synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisJob {
    pub text: String,
    pub speaker_id: Option<String>,
    pub language_id: String,
    pub speed: f32,
    pub reference_audio: Option<PathBuf>,
}

impl RawFields {
    /// Validate and apply defaults
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::Validation`] when text is missing or blank, or
    /// speed is not a positive number
    pub fn resolve(self) -> crate::Result<SynthesisJob> {
        let text = non_blank(self.text).ok_or_else(|| TtsError::Validation("No text provided".to_string()))?;

        let speed = match non_blank(self.speed) {
            None => DEFAULT_SPEED,
            Some(raw) => parse_speed(&raw)?,
        };

        Ok(SynthesisJob {
            text,
            speaker_id: non_blank(self.speaker_id),
            language_id: non_blank(self.language_id).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            speed,
            reference_audio: None,
        })
    }
}

impl SynthesisJob {
    /// Build the engine call for a model with the given capabilities
    ///
    /// A speaker is passed only when the model supports speakers, a
    /// language only when it supports languages. With a reference
    /// recording present the speaker is still forwarded when supported;
    /// which one wins is up to the engine.
    pub fn finalize<'a>(&'a self, capabilities: &Capabilities, output: &'a Path) -> EngineInvocation<'a> {
        let speaker = self
            .speaker_id
            .as_deref()
            .filter(|_| capabilities.supports_speakers);

        let language = capabilities.supports_languages.then_some(self.language_id.as_str());

        #[allow(clippy::float_cmp)]
        let speed = (self.speed != DEFAULT_SPEED).then_some(self.speed);

        EngineInvocation {
            text: &self.text,
            output,
            reference_audio: self.reference_audio.as_deref(),
            speaker,
            language,
            speed,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_speed(raw: &str) -> crate::Result<f32> {
    match raw.parse::<f32>() {
        Ok(speed) if speed.is_finite() && speed > 0.0 => Ok(speed),
        Ok(_) => Err(TtsError::Validation(format!("speed must be greater than 0, got {raw}"))),
        Err(_) => Err(TtsError::Validation(format!("speed must be a number, got '{raw}'"))),
    }
}

/// Accept a string, a number or null for a textual field
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;

    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: serde::de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(Visitor)
}
