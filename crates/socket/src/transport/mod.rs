//! Transport - the physical connection, split into halves
//!
//! The session owns the write half behind a lock and hands the read half to
//! its read loop, so sends never wait on a pending read. Handshake, framing
//! and TLS live below this seam.

use async_trait::async_trait;

use crate::error::TransportError;

pub mod memory;
pub mod websocket;

pub use memory::RemoteEnd;
pub use websocket::{WebSocketFrames, WebSocketSink};

/// Write half: one complete text frame per call
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half
#[async_trait]
pub trait FrameStream: Send + 'static {
    /// Next data frame, text or binary, as raw bytes. Validating them is
    /// the codec's job. `Ok(None)` means the peer closed cleanly.
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}
