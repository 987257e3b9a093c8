//! Wire Protocol Types
//!
//! One JSON object per frame:
//! `{id?: integer, method?: string, params?: any, result?: any, error?: {code, message}}`
//!
//! Payloads stay as raw JSON text until a wrapper or handler decodes them.
//! The core never needs to know what a domain's data looks like.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;

/// Request ID - monotonically increasing, unique for the session's lifetime
pub type RequestId = u64;

/// Command envelope written to the wire
#[derive(Debug, Serialize)]
pub struct OutboundCommand<'a, P> {
    pub id: RequestId,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a P>,
}

/// Error object carried by a response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A decoded inbound frame, before classification
#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Box<RawValue>>,
    #[serde(default)]
    pub result: Option<Box<RawValue>>,
    #[serde(default)]
    pub error: Option<RemoteError>,
}

/// Undecoded JSON payload (`params` of an event, `result` of a response)
#[derive(Debug, Clone, Default)]
pub struct Payload(Option<Box<RawValue>>);

impl Payload {
    pub fn new(raw: Option<Box<RawValue>>) -> Self {
        Self(raw)
    }

    /// True when the frame carried no payload at all
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Raw JSON text. An absent payload reads as `null`.
    pub fn get(&self) -> &str {
        self.0.as_deref().map_or("null", RawValue::get)
    }

    /// Decode into the caller's expected structure
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(self.get())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}
