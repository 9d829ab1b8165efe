//! Per-request errors and their HTTP mapping.
//!
//! These never escape the handler: each becomes a response for the caller
//! that sent the request and leaves every other request alone.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use thiserror::Error;

use crate::translate::{PayloadError, TranslateError};

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("malformed alert payload: {0}")]
    MalformedPayload(#[from] PayloadError),

    #[error("unable to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to serialize notification: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("unable to build upstream url: {0}")]
    InvalidTarget(#[source] url::ParseError),

    #[error("upstream request failed: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),
}

impl ProxyError {
    /// Classify a failed body read. Overrunning the size limit mid-stream
    /// gets the same 413 as an oversized `Content-Length`.
    pub fn from_body_error(err: axum::Error, limit: usize) -> Self {
        let mut source: Option<&(dyn StdError + 'static)> = Some(&err);
        while let Some(e) = source {
            if e.is::<LengthLimitError>() {
                return ProxyError::BodyTooLarge { limit };
            }
            source = e.source();
        }
        ProxyError::BodyRead(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MalformedPayload(_) | ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Serialization(_) | ProxyError::InvalidTarget(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MalformedPayload(_) => "malformed_payload",
            ProxyError::BodyRead(_) => "body_read",
            ProxyError::BodyTooLarge { .. } => "body_too_large",
            ProxyError::Serialization(_) => "serialization",
            ProxyError::InvalidTarget(_) => "invalid_target",
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
        }
    }
}

impl From<TranslateError> for ProxyError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::Payload(e) => ProxyError::MalformedPayload(e),
            TranslateError::Serialization(e) => ProxyError::Serialization(e),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Transport details stay in the logs.
        let message = match &self {
            ProxyError::UpstreamUnreachable(_) => "Upstream request failed".to_string(),
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}
