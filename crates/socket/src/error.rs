//! Error types for the socket core
//!
//! Two layers: `TransportError` for the physical connection, `SocketError`
//! for everything a caller of `Session::send_command` can observe.

use thiserror::Error;

use crate::protocol::RemoteError;

pub type Result<T> = std::result::Result<T, SocketError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Connect failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("Send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("Receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    #[error("Connection closed")]
    ConnectionClosed,
}

#[derive(Debug, Error)]
pub enum SocketError {
    /// Command parameters could not be encoded. Nothing was written.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("Session closed")]
    SessionClosed,

    /// The remote answered the command with an explicit `error` object.
    #[error("Remote error {0}")]
    Remote(RemoteError),
}

impl SocketError {
    /// True for errors that end the session, as opposed to failing one command.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SocketError::Transport(_) | SocketError::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = SocketError::Remote(RemoteError {
            code: -32601,
            message: "'X.y' wasn't found".to_string(),
            data: None,
        });
        assert_eq!(err.to_string(), "Remote error -32601: 'X.y' wasn't found");
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_transport_errors_are_terminal() {
        let err: SocketError = TransportError::ConnectionClosed.into();
        assert!(err.is_terminal());
        assert!(SocketError::SessionClosed.is_terminal());
    }
}
