//! Typed commands and events
//!
//! Domain wrappers describe each protocol method as a params struct that
//! knows its method name and response type. The session stays ignorant of
//! every domain's data shapes; decoding happens here, at the edge.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SocketError};
use crate::protocol::Payload;
use crate::session::Session;

/// A protocol command: serializes to its `params`
pub trait Command: Serialize + Sync {
    const METHOD: &'static str;
    type Response: DeserializeOwned;
}

/// A protocol event: deserializes from its `params`
pub trait Event: DeserializeOwned {
    const NAME: &'static str;
}

/// Response for commands whose result carries nothing. Accepts any shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack;

impl<'de> Deserialize<'de> for Ack {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Ack)
    }
}

impl Session {
    /// Send a typed command and decode its result.
    ///
    /// A remote error is returned as-is; the result is only decoded when
    /// the response carried none.
    pub async fn execute<C: Command>(&self, command: &C) -> Result<C::Response> {
        let result = self.send_command(C::METHOD, Some(command)).await?;
        result.decode().map_err(|e| {
            tracing::error!(method = C::METHOD, error = %e, "Failed to decode command result");
            SocketError::MalformedPayload(e)
        })
    }

    /// Subscribe with a typed callback.
    ///
    /// Payloads that don't decode as `E` are logged and skipped; the
    /// callback only ever sees well-formed events.
    pub fn on<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(E) + Send + Sync + 'static,
    {
        self.on_event(E::NAME, move |method: &str, params: &Payload| {
            match params.decode::<E>() {
                Ok(event) => callback(event),
                Err(e) => tracing::error!(method, error = %e, "Failed to decode event"),
            }
        });
    }
}
