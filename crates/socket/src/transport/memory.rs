//! In-memory transport
//!
//! Stands in for the browser: the [`RemoteEnd`] sees every frame the session
//! writes and decides what comes back. Used by tests and offline demos.

use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{FrameSink, FrameStream};
use crate::error::TransportError;

type Inbound = Result<Vec<u8>, TransportError>;

pub struct MemorySink {
    /// `None` once closed, which ends the remote's view of the stream
    tx: Option<mpsc::UnboundedSender<String>>,
    fail_writes: Arc<AtomicBool>,
}

pub struct MemoryFrames {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

/// The peer's side of an in-memory connection
pub struct RemoteEnd {
    sent: mpsc::UnboundedReceiver<String>,
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
    fail_writes: Arc<AtomicBool>,
}

/// Create a connected sink/stream pair plus the remote end driving it
pub fn pair() -> (MemorySink, MemoryFrames, RemoteEnd) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let fail_writes = Arc::new(AtomicBool::new(false));

    (
        MemorySink {
            tx: Some(out_tx),
            fail_writes: fail_writes.clone(),
        },
        MemoryFrames { rx: in_rx },
        RemoteEnd {
            sent: out_rx,
            inbound: Some(in_tx),
            fail_writes,
        },
    )
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::ConnectionClosed)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write failure injected by remote end",
            )));
        }
        tx.send(frame).map_err(|_| {
            TransportError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "remote end dropped",
            ))
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}

#[async_trait]
impl FrameStream for MemoryFrames {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.rx.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

impl RemoteEnd {
    /// Deliver a frame to the session
    pub fn push(&self, frame: impl Into<String>) {
        self.push_bytes(frame.into().into_bytes());
    }

    /// Deliver a frame as raw bytes, valid UTF-8 or not
    pub fn push_bytes(&self, frame: Vec<u8>) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.send(Ok(frame));
        }
    }

    /// Next frame the session wrote, or `None` once its sink is gone
    pub async fn next_sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Next written frame parsed as JSON. Unparseable frames yield `None`.
    pub async fn next_command(&mut self) -> Option<Value> {
        let frame = self.next_sent().await?;
        serde_json::from_str(&frame).ok()
    }

    /// Answer a command with `result`
    pub fn respond(&self, id: u64, result: Value) {
        self.push(serde_json::json!({ "id": id, "result": result }).to_string());
    }

    /// Push an event frame
    pub fn emit(&self, method: &str, params: Value) {
        self.push(serde_json::json!({ "method": method, "params": params }).to_string());
    }

    /// Make every subsequent session write fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Make the session's next read fail at the transport level
    pub fn fail_read(&self) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.send(Err(TransportError::ReceiveFailed(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "read failure injected by remote end",
            ))));
        }
    }

    /// Close the connection from the remote side
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }
}
