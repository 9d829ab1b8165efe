//! Payload translation.
//!
//! # Data Flow
//! ```text
//! buffered request body (Bytes, read once)
//!     → payload.rs (parse InboundAlertPayload; malformed → 400)
//!     → dashboardId absent?  → PassThrough (original bytes, untouched)
//!     → dashboardId present? → notification.rs → Rewrite(new bytes)
//! ```
//!
//! The buffered body is only borrowed here, so the forwarder can still send
//! the original bytes when nothing is rewritten.

pub mod notification;
pub mod payload;

use axum::body::Bytes;
use thiserror::Error;

pub use notification::{NotificationType, OutboundNotification};
pub use payload::{InboundAlertPayload, PayloadError};

/// What to forward for a given inbound body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Forward the original body byte-for-byte.
    PassThrough,
    /// Forward this serialized notification instead.
    Rewrite(Bytes),
}

impl Translation {
    pub fn is_rewrite(&self) -> bool {
        matches!(self, Translation::Rewrite(_))
    }

    /// Label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Translation::PassThrough => "pass_through",
            Translation::Rewrite(_) => "rewrite",
        }
    }

    /// The body to forward, given the original one.
    pub fn into_body(self, original: Bytes) -> Bytes {
        match self {
            Translation::PassThrough => original,
            Translation::Rewrite(body) => body,
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("failed to serialize notification: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Decide whether `body` is forwarded as-is or rewritten for Apprise.
pub fn translate(body: &[u8]) -> Result<Translation, TranslateError> {
    let alert = InboundAlertPayload::from_slice(body)?;

    if !alert.is_dashboard_alert() {
        return Ok(Translation::PassThrough);
    }

    let notification = OutboundNotification::from_alert(&alert);
    let bytes = serde_json::to_vec(&notification).map_err(TranslateError::Serialization)?;

    Ok(Translation::Rewrite(Bytes::from(bytes)))
}
