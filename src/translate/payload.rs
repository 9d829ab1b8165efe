//! Inbound Grafana alert webhook payload.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an inbound body could not be read as an alert payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("body does not match the alert payload shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Grafana alert notification body.
///
/// Only `dashboard_id`, `state`, `message` and `title` drive translation.
/// Every field is optional; `null` is read as the field's zero value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundAlertPayload {
    /// Present only for alerts raised from a dashboard panel.
    #[serde(default)]
    pub dashboard_id: Option<i64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub eval_matches: Vec<EvalMatch>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub org_id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub panel_id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_url: String,

    /// `ok`, `alerting`, `no_data`, `pending`, ...
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// One series that matched the alert rule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EvalMatch {
    /// Grafana sends `null` for series without data.
    #[serde(default)]
    pub value: Option<f64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metric: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Map<String, Value>,
}

impl InboundAlertPayload {
    /// Parse a raw request body. The top-level value must be an object.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(body).map_err(PayloadError::InvalidJson)?;

        let kind = match &value {
            Value::Object(_) => None,
            Value::Null => Some("null"),
            Value::Bool(_) => Some("a boolean"),
            Value::Number(_) => Some("a number"),
            Value::String(_) => Some("a string"),
            Value::Array(_) => Some("an array"),
        };
        if let Some(kind) = kind {
            return Err(PayloadError::NotAnObject(kind));
        }

        serde_json::from_value(value).map_err(PayloadError::Shape)
    }

    /// Whether the payload came from a dashboard alert and needs translating.
    pub fn is_dashboard_alert(&self) -> bool {
        self.dashboard_id.is_some()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
