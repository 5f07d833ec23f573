//! Remote decision: the `data` object returned by the configuration endpoint.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `{"data": {"display": <number>, "home_url"?: <string>}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteDecision {
    #[serde(default)]
    pub home_url: Option<String>,
    /// Truthiness of the remote `display` field: true means keep the placeholder.
    #[serde(default, deserialize_with = "truthy")]
    pub display: bool,
}

impl RemoteDecision {
    /// URL to navigate to, if the service asked for navigation. Empty URLs count as absent.
    pub fn navigation_target(&self) -> Option<&str> {
        if self.display {
            return None;
        }
        self.home_url.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<RemoteDecision>,
}

/// Parse a response body. Anything other than an object with a `data` object is an error.
pub fn parse_decision(body: &[u8]) -> Result<RemoteDecision, DecisionError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    envelope.data.ok_or(DecisionError::MissingData)
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("response is not a decision object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response has no data field")]
    MissingData,
}

/// Numbers are truthy when nonzero, booleans as-is, null is falsy. Strings, arrays and
/// objects are rejected rather than guessed at.
fn truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        other => Err(serde::de::Error::custom(format!(
            "display must be a number, got {other}"
        ))),
    }
}
