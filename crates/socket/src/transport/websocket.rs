//! WebSocket transport via `tokio-tungstenite`

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{FrameSink, FrameStream};
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
}

pub struct WebSocketFrames {
    inner: SplitStream<WsStream>,
}

/// Validate the endpoint and perform the WebSocket handshake
pub async fn connect(
    url: &str,
    timeout: Duration,
) -> Result<(WebSocketSink, WebSocketFrames), TransportError> {
    let url = endpoint(url)?;

    let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| TransportError::ConnectTimeout(timeout))?
        .map_err(TransportError::Connect)?;

    tracing::debug!(url = %url, "WebSocket connected");

    let (sink, stream) = ws_stream.split();
    Ok((WebSocketSink { inner: sink }, WebSocketFrames { inner: stream }))
}

fn endpoint(url: &str) -> Result<Url, TransportError> {
    let url = Url::parse(url)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::UnsupportedScheme(other.to_string())),
    }
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
        self.inner
            .send(Message::Text(frame))
            .await
            .map_err(|e| TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, e)))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, e)))
    }
}

#[async_trait]
impl FrameStream for WebSocketFrames {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.into_bytes())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        e,
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_accepts_ws_schemes() {
        assert!(endpoint("ws://localhost:9222/devtools/browser").is_ok());
        assert!(endpoint("wss://example.com/devtools/page/ABC").is_ok());
    }

    #[test]
    fn test_endpoint_rejects_other_schemes() {
        let err = endpoint("http://localhost:9222/json").unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(ref s) if s == "http"));

        let err = endpoint("not a url").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        // Port 9 (discard) is almost never listening
        let result = connect("ws://127.0.0.1:9/devtools", Duration::from_secs(2)).await;
        assert!(matches!(
            result,
            Err(TransportError::Connect(_)) | Err(TransportError::ConnectTimeout(_))
        ));
    }
}
