//! Apprise notification body.

use serde::{Deserialize, Serialize};

use crate::translate::payload::InboundAlertPayload;

/// Apprise notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Failure,
    Warning,
    Info,
}

impl NotificationType {
    /// Map a Grafana alert state. Exact, case-sensitive match; anything
    /// unrecognised is `Info`.
    pub fn from_state(state: &str) -> Self {
        match state {
            "ok" => Self::Success,
            "alerting" | "no_data" => Self::Failure,
            "pending" => Self::Warning,
            _ => Self::Info,
        }
    }
}

/// Body posted to Apprise's notify endpoint.
///
/// `urls` is left empty; Apprise fills it from its own stored configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundNotification {
    pub urls: String,
    pub body: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
}

impl OutboundNotification {
    pub fn from_alert(alert: &InboundAlertPayload) -> Self {
        Self {
            urls: String::new(),
            body: alert.message.clone(),
            title: alert.title.clone(),
            kind: NotificationType::from_state(&alert.state),
        }
    }
}
