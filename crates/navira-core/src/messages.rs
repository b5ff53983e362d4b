//! Inbound frame model.
//!
//! Every text frame is a JSON object discriminated by its `type` field. The
//! set of understood types is closed; anything else lands in
//! [`InboundMessage::Unknown`] so callers always get an explicit default arm.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::{AttachmentError, ParseError};

/// Position payload shared by `location` pings and `sos` alerts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub timestamp: Option<String>,
}

/// Incident payload with embedded base64 attachments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub timestamp: Option<String>,
    /// Kept untyped so one malformed entry fails alone; see [`attachment_text`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Value>,
    #[serde(default)]
    pub voice: Option<Value>,
    /// Reporter identity sent by the mobile client as `encrypted_id`.
    #[serde(default, rename = "encrypted_id")]
    pub reporter_id: Option<String>,
}

impl IncidentReport {
    /// Client timestamp, or the current UTC time when the client sent none.
    pub fn resolved_timestamp(&self) -> String {
        self.timestamp.clone().unwrap_or_else(now_timestamp)
    }

    /// The voice clip, if one was attached and is not null or an empty string.
    pub fn voice_payload(&self) -> Option<&Value> {
        self.voice
            .as_ref()
            .filter(|v| !v.is_null() && v.as_str() != Some(""))
    }
}

/// One parsed frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    Location(PositionReport),
    Sos(PositionReport),
    Incident(IncidentReport),
    /// Unrecognized `type`; `None` when the field is absent or null.
    Unknown { kind: Option<Value> },
}

impl InboundMessage {
    /// The discriminator as it appears on the wire.
    pub fn kind(&self) -> String {
        match self {
            Self::Location(_) => "location".into(),
            Self::Sos(_) => "sos".into(),
            Self::Incident(_) => "incident".into(),
            Self::Unknown { kind } => kind_label(kind.as_ref()),
        }
    }
}

/// Parse one text frame into a message.
pub fn parse_frame(text: &str) -> Result<InboundMessage, ParseError> {
    let value: Value = serde_json::from_str(text).map_err(ParseError::InvalidJson)?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject(json_type_name(&value)));
    }

    let kind = value.get("type").filter(|v| !v.is_null()).cloned();
    match kind.as_ref().and_then(Value::as_str) {
        Some("location") => Ok(InboundMessage::Location(payload("location", value)?)),
        Some("sos") => Ok(InboundMessage::Sos(payload("sos", value)?)),
        Some("incident") => Ok(InboundMessage::Incident(payload("incident", value)?)),
        _ => Ok(InboundMessage::Unknown { kind }),
    }
}

/// Render a `type` value for logs: bare string, JSON for anything else,
/// `null` when absent.
pub fn kind_label(kind: Option<&Value>) -> String {
    match kind {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".into(),
    }
}

/// The base64 text of one attachment entry. Non-string entries fail on
/// their own without affecting the rest of the incident.
pub fn attachment_text(value: &Value) -> Result<&str, AttachmentError> {
    value
        .as_str()
        .ok_or_else(|| AttachmentError::NotAString(json_type_name(value)))
}

/// Current UTC time in RFC 3339 with microseconds, e.g. `2025-09-12T08:40:00.123456Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn payload<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, ParseError> {
    serde_json::from_value(value).map_err(|source| ParseError::InvalidField { kind, source })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string or a number (e.g. epoch seconds) as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid type: {}, expected a string or number",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
