use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Query},
};
use http::{Method, header::CONTENT_TYPE, request::Parts};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    error::TtsError,
    resolver::RawFields,
    types::{ReferenceUpload, SynthesisRequest},
};

/// Body limit for JSON requests (1 MiB)
pub const JSON_BODY_LIMIT_BYTES: usize = 1 << 20;

/// Body limit for multipart uploads (32 MiB)
pub const MULTIPART_BODY_LIMIT_BYTES: usize = 32 << 20;

/// Multipart fields that may carry the reference recording
const REFERENCE_FIELDS: &[&str] = &["speaker_wav", "reference_audio"];

/// Extractor that decodes a synthesis request from any supported transport
///
/// `GET` reads the query string. `POST` reads a JSON body, a multipart
/// form, or the query string when the request has no content type.
pub struct ExtractSynthesis(pub SynthesisRequest);

impl<S> FromRequest<S> for ExtractSynthesis
where
    S: Send + Sync,
{
    type Rejection = TtsError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        let request = if parts.method == Method::GET || content_type.is_none() {
            from_query(&parts)?
        } else {
            match content_type.as_deref().unwrap_or_default() {
                ct if ct.starts_with("application/json") => SynthesisRequest {
                    fields: read_json(body).await?,
                    reference: None,
                },
                ct if ct.starts_with("multipart/form-data") => from_multipart(parts, body).await?,
                ct => {
                    return Err(TtsError::Validation(format!(
                        "Unsupported Content-Type '{ct}', expected application/json or multipart/form-data"
                    )));
                }
            }
        };

        Ok(Self(request))
    }
}

/// Extractor for small JSON bodies where an empty body means "all defaults"
pub struct ExtractJson<T>(pub T);

impl<S, T> FromRequest<S> for ExtractJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = TtsError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(read_json(request.into_body()).await?))
    }
}

fn from_query(parts: &Parts) -> crate::Result<SynthesisRequest> {
    let Query(fields) = Query::<RawFields>::try_from_uri(&parts.uri)
        .map_err(|e| TtsError::Validation(format!("Failed to parse query string: {e}")))?;

    Ok(SynthesisRequest {
        fields,
        reference: None,
    })
}

async fn read_json<T: DeserializeOwned + Default>(body: Body) -> crate::Result<T> {
    let bytes = read_body(body, JSON_BODY_LIMIT_BYTES).await?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(&bytes).map_err(|e| TtsError::Validation(format!("Failed to parse request body: {e}")))
}

async fn read_body(body: Body, limit: usize) -> crate::Result<axum::body::Bytes> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
            TtsError::PayloadTooLarge(limit)
        } else {
            TtsError::Validation(format!("Failed to read request body: {err}"))
        }
    })
}

async fn from_multipart(parts: Parts, body: Body) -> crate::Result<SynthesisRequest> {
    let bytes = read_body(body, MULTIPART_BODY_LIMIT_BYTES).await?;

    // Extensions carry the route's body limit through to the multipart parser
    let rebuilt = http::Request::from_parts(parts, Body::from(bytes));

    let mut multipart = Multipart::from_request(rebuilt, &())
        .await
        .map_err(|e| TtsError::Validation(format!("Failed to parse multipart form: {e}")))?;

    let mut fields = Map::new();
    let mut reference = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(&e)),
        };

        let name = field.name().unwrap_or_default().to_string();

        if REFERENCE_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().map(str::to_string);
            let data = field.bytes().await.map_err(|e| multipart_error(&e))?;

            // Browsers send an empty part for an untouched file input
            if data.is_empty() {
                continue;
            }

            reference = Some(ReferenceUpload {
                data: data.to_vec(),
                filename,
            });
        } else {
            let value = field.text().await.map_err(|e| multipart_error(&e))?;
            fields.insert(name, Value::String(value));
        }
    }

    let fields = serde_json::from_value(Value::Object(fields))
        .map_err(|e| TtsError::Validation(format!("Invalid form field: {e}")))?;

    Ok(SynthesisRequest { fields, reference })
}

fn multipart_error(err: &axum::extract::multipart::MultipartError) -> TtsError {
    if err.status() == http::StatusCode::PAYLOAD_TOO_LARGE {
        TtsError::PayloadTooLarge(MULTIPART_BODY_LIMIT_BYTES)
    } else {
        TtsError::Validation(format!("Failed to read multipart form: {err}"))
    }
}
