use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::resolver::RawFields;

/// MIME type of the canonical output container
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// A reference recording uploaded for voice cloning
#[derive(Debug, Clone)]
pub struct ReferenceUpload {
    /// Raw file contents
    pub data: Vec<u8>,
    /// Client-side filename, used only to infer the container
    pub filename: Option<String>,
}

/// Transport-independent synthesis request
#[derive(Debug, Default)]
pub struct SynthesisRequest {
    /// Decoded request fields
    pub fields: RawFields,
    /// Optional voice-cloning reference
    pub reference: Option<ReferenceUpload>,
}

/// Synthesized audio ready to hand to the transport
#[derive(Debug)]
pub struct AudioResult {
    /// Raw audio bytes
    pub audio: Vec<u8>,
    /// Content type of the audio (e.g. "audio/wav")
    pub content_type: String,
}

impl AudioResult {
    pub fn wav(audio: Vec<u8>) -> Self {
        Self {
            audio,
            content_type: WAV_CONTENT_TYPE.to_string(),
        }
    }

    /// Convert the audio into an axum HTTP response
    pub fn into_response(self) -> axum::response::Response {
        axum::response::Response::builder()
            .header(http::header::CONTENT_TYPE, self.content_type)
            .body(axum::body::Body::from(self.audio))
            .unwrap_or_else(|_| {
                use axum::response::IntoResponse;
                http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
            })
    }
}

/// Body of `POST /model`
#[derive(Debug, Default, Deserialize)]
pub struct ModelSelection {
    #[serde(default, rename = "modelName", alias = "model_name")]
    pub model_name: Option<String>,
}

/// Successful model switch
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSelected {
    pub status: String,
    pub model: String,
}

/// Body of `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub model: Option<String>,
    pub endpoints: IndexMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_endpoints_serialize_in_insertion_order() {
        let status = StatusResponse {
            status: "ok".to_string(),
            model: None,
            endpoints: [("synthesize", "/synthesize"), ("models", "/models"), ("status", "/")]
                .into_iter()
                .map(|(name, path)| (name.to_string(), path.to_string()))
                .collect(),
        };

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(
            json,
            r#"{"status":"ok","model":null,"endpoints":{"synthesize":"/synthesize","models":"/models","status":"/"}}"#
        );

        let parsed: StatusResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.endpoints.get_index(0).unwrap().0, "synthesize");
    }
}
