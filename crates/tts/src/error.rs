use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtsError>;

/// Synthesis pipeline errors with their HTTP status codes
#[derive(Debug, Error)]
pub enum TtsError {
    /// Missing or malformed input, detected before any file or engine work
    #[error("{0}")]
    Validation(String),

    /// Request body exceeded the configured limit
    #[error("Request body is too large, limit is {0} bytes")]
    PayloadTooLarge(usize),

    /// The transcoder executable could not be found
    #[error("{0} not found. Please install {0} for audio format conversion.")]
    ToolMissing(String),

    /// The transcoder ran and rejected the input
    #[error("Audio format conversion failed: {0}")]
    TranscodeFailed(String),

    /// No model has been loaded yet
    #[error("No model loaded")]
    NoModelLoaded,

    /// A model could not be loaded; the previously active model is untouched
    #[error("Failed to load model '{model}': {message}")]
    ModelLoadFailed { model: String, message: String },

    /// The synthesis engine failed; its message is passed through
    #[error("{0}")]
    Engine(String),

    /// Internal server error
    /// If Some(message), the details are safe to show
    /// If None, details stay in the logs
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl TtsError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ToolMissing(_)
            | Self::TranscodeFailed(_)
            | Self::NoModelLoaded
            | Self::ModelLoadFailed { .. }
            | Self::Engine(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind, used in logs
    pub fn error_type(&self) -> &str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::ToolMissing(_) => "tool_missing",
            Self::TranscodeFailed(_) => "transcode_failed",
            Self::NoModelLoaded => "no_model_loaded",
            Self::ModelLoadFailed { .. } => "model_load_failed",
            Self::Engine(_) => "engine_error",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to API consumers
    pub fn client_message(&self) -> String {
        match self {
            Self::InternalError(Some(message)) => message.clone(),
            _ => self.to_string(),
        }
    }

    pub(crate) fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{context}: {err}");
        Self::InternalError(None)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::warn!(error_type = self.error_type(), %status, "request failed: {self}");
        } else {
            tracing::debug!(error_type = self.error_type(), %status, "request rejected: {self}");
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request() {
        let err = TtsError::Validation("No text provided".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "No text provided");
    }

    #[test]
    fn pipeline_failures_are_server_errors() {
        let errors = [
            TtsError::ToolMissing("ffmpeg".into()),
            TtsError::TranscodeFailed("Invalid data found".into()),
            TtsError::NoModelLoaded,
            TtsError::ModelLoadFailed {
                model: "m".into(),
                message: "boom".into(),
            },
            TtsError::Engine("Language xx is not supported".into()),
        ];

        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{err:?}");
        }
    }

    #[test]
    fn tool_missing_and_transcode_failed_are_distinguishable() {
        let missing = TtsError::ToolMissing("ffmpeg".into());
        let failed = TtsError::TranscodeFailed("exit status 1".into());

        assert_ne!(missing.error_type(), failed.error_type());
        assert!(missing.client_message().starts_with("ffmpeg not found"));
        assert!(failed.client_message().contains("exit status 1"));
    }

    #[test]
    fn internal_details_are_hidden() {
        assert_eq!(TtsError::InternalError(None).client_message(), "Internal server error");
        assert_eq!(
            TtsError::InternalError(Some("disk full".into())).client_message(),
            "disk full"
        );
    }
}
