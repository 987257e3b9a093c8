//! Socket Session - The Core Communication Layer
//!
//! Design decisions:
//! 1. One connection per session, one read loop per connection
//! 2. Request/response matching via ID, events fanned out by method name
//! 3. Writes serialized behind a single lock, reads never take it
//! 4. Fail fast - no retries, no internal timeouts. Let the caller decide.
//!
//! Lifecycle: `Connecting -> Open -> Closing -> Closed`. Closing is terminal;
//! a closed session is never reopened. Whatever ends the session (explicit
//! close, read failure, write failure, remote hang-up), every pending call
//! is failed with `SessionClosed` and the event registry is cleared in the
//! same step that enters `Closing`. The read loop task then releases the
//! connection and publishes `Closed`, so no caller's future has to survive
//! for the session to finish closing.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use uuid::Uuid;

use crate::codec;
use crate::error::{Result, SocketError, TransportError};
use crate::events::{EventHandler, EventRegistry};
use crate::pending::PendingCalls;
use crate::protocol::{InboundEnvelope, Payload, RemoteError, RequestId};
use crate::transport::{websocket, FrameSink, FrameStream};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Label attached to every log line of this session
    pub id: String,
    pub url: String,
    /// Applies to the WebSocket handshake only
    pub connect_timeout: Duration,
    /// Trace every raw frame in both directions
    pub log_frames: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            url: "ws://localhost:9222/devtools/browser".to_string(),
            connect_timeout: Duration::from_secs(10),
            log_frames: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Counters for traffic the session dropped or had nobody to deliver to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_received: u64,
    pub malformed_frames: u64,
    pub unmatched_responses: u64,
    pub unhandled_events: u64,
    pub unclassified_frames: u64,
}

#[derive(Default)]
struct Counters {
    frames_received: AtomicU64,
    malformed_frames: AtomicU64,
    unmatched_responses: AtomicU64,
    unhandled_events: AtomicU64,
    unclassified_frames: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            unmatched_responses: self.unmatched_responses.load(Ordering::Relaxed),
            unhandled_events: self.unhandled_events.load(Ordering::Relaxed),
            unclassified_frames: self.unclassified_frames.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Requested,
    RemoteClosed,
    ReadFailed,
    WriteFailed,
}

/// Socket Session - owns one connection, correlates commands, fans out events
pub struct Session {
    config: SessionConfig,

    state: watch::Sender<SessionState>,

    /// In-flight commands. Key: request id, Value: completion slot
    pending: PendingCalls,

    /// Key: method name (e.g., "LayerTree.layerPainted"), Value: handlers
    events: EventRegistry,

    /// Write half, locked for the duration of one frame
    sink: Mutex<Box<dyn FrameSink>>,

    /// Stops the read loop, which then closes the sink
    shutdown_tx: mpsc::Sender<()>,

    /// Sink close failure, handed to the `close()` call that started closing
    close_error: Mutex<Option<TransportError>>,

    counters: Counters,
}

impl Session {
    /// Connect to a WebSocket endpoint and start the session
    pub async fn connect(config: SessionConfig) -> Result<Arc<Self>> {
        let (sink, frames) = websocket::connect(&config.url, config.connect_timeout).await?;
        Ok(Self::start(config, sink, frames))
    }

    /// Start a session over an already-connected transport.
    ///
    /// Spawns the read loop, so this must run inside a tokio runtime.
    pub fn start<S, F>(config: SessionConfig, sink: S, frames: F) -> Arc<Self>
    where
        S: FrameSink,
        F: FrameStream,
    {
        let (state, _) = watch::channel(SessionState::Connecting);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        let session = Arc::new(Self {
            config,
            state,
            pending: PendingCalls::new(),
            events: EventRegistry::new(),
            sink: Mutex::new(Box::new(sink)),
            shutdown_tx,
            close_error: Mutex::new(None),
            counters: Counters::default(),
        });

        tokio::spawn(session.clone().read_loop(Box::new(frames), shutdown_rx));

        // The read loop may already have hit EOF and started closing
        session.state.send_if_modified(|state| {
            if *state == SessionState::Connecting {
                *state = SessionState::Open;
                true
            } else {
                false
            }
        });
        tracing::debug!(session = %session.config.id, "Session open");

        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Observe state transitions, e.g. to learn that the remote went away
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    /// Number of commands still waiting for a response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Send a command and wait for its response.
    ///
    /// There is no internal timeout: a command the remote never answers
    /// waits until the session closes. Wrap the call in
    /// `tokio::time::timeout` for a bounded wait; dropping the future
    /// releases the pending entry.
    pub async fn send_command<P>(&self, method: &str, params: Option<&P>) -> Result<Payload>
    where
        P: Serialize + Sync,
    {
        if self.state() != SessionState::Open {
            return Err(SocketError::SessionClosed);
        }

        let call = self.pending.register()?;
        let id = call.id();
        let frame = codec::encode(id, method, params)?;

        if self.config.log_frames {
            tracing::trace!(session = %self.config.id, frame = %frame, "-> frame");
        }
        tracing::debug!(session = %self.config.id, id, method, "Sending command");

        let written = {
            let mut sink = self.sink.lock().await;
            sink.send_frame(frame).await
        };

        if let Err(e) = written {
            drop(call);
            if !self.begin_close(Termination::WriteFailed) {
                return Err(SocketError::SessionClosed);
            }
            tracing::error!(session = %self.config.id, id, method, error = %e, "Write failed");
            return Err(SocketError::Transport(e));
        }

        call.wait().await
    }

    /// Add a handler for an event method name
    pub fn register_handler(&self, method: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.events.register(method, handler);
    }

    /// Closure form of [`register_handler`](Self::register_handler)
    pub fn on_event<F>(&self, method: impl Into<String>, callback: F)
    where
        F: Fn(&str, &Payload) + Send + Sync + 'static,
    {
        self.events.subscribe(method, callback);
    }

    /// Close the session. Resolves once it is fully closed.
    ///
    /// Idempotent; if the session is already closing for another reason
    /// this waits for that to finish. Pending calls are failed on the first
    /// poll, so dropping this future early still closes the session.
    pub async fn close(&self) -> Result<()> {
        let initiated = self.begin_close(Termination::Requested);

        let mut state = self.state.subscribe();
        let _ = state.wait_for(|s| *s == SessionState::Closed).await;

        if initiated {
            if let Some(e) = self.close_error.lock().await.take() {
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn read_loop(
        self: Arc<Self>,
        mut frames: Box<dyn FrameStream>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let termination = loop {
            tokio::select! {
                frame = frames.next_frame() => match frame {
                    Ok(Some(frame)) => self.handle_frame(&frame),
                    Ok(None) => {
                        tracing::info!(session = %self.config.id, "Connection closed by remote");
                        break Some(Termination::RemoteClosed);
                    }
                    Err(e) => {
                        tracing::error!(session = %self.config.id, error = %e, "Read failed");
                        break Some(Termination::ReadFailed);
                    }
                },
                _ = shutdown_rx.recv() => {
                    tracing::debug!(session = %self.config.id, "Read loop stopping");
                    break None;
                }
            }
        };

        if let Some(termination) = termination {
            self.begin_close(termination);
        }
        self.finish_close().await;
    }

    fn handle_frame(&self, frame: &[u8]) {
        if self.config.log_frames {
            tracing::trace!(
                session = %self.config.id,
                frame = %String::from_utf8_lossy(frame),
                "<- frame"
            );
        }

        self.route_frame(frame);
        // Counted after routing, so handlers have run by the time it moves
        Counters::bump(&self.counters.frames_received);
    }

    fn route_frame(&self, frame: &[u8]) {
        let envelope = match codec::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                Counters::bump(&self.counters.malformed_frames);
                tracing::warn!(session = %self.config.id, error = %e, "Discarding malformed frame");
                return;
            }
        };

        let InboundEnvelope {
            id,
            method,
            params,
            result,
            error,
        } = envelope;

        match (id, method) {
            (Some(id), None) => self.route_response(id, result, error),
            (Some(id), Some(_)) if self.pending.contains(id) => {
                self.route_response(id, result, error)
            }
            (_, Some(method)) => self.route_event(&method, Payload::new(params)),
            (None, None) => {
                Counters::bump(&self.counters.unclassified_frames);
                tracing::warn!(
                    session = %self.config.id,
                    "Discarding frame with neither id nor method"
                );
            }
        }
    }

    fn route_response(
        &self,
        id: RequestId,
        result: Option<Box<serde_json::value::RawValue>>,
        error: Option<RemoteError>,
    ) {
        let outcome = match error {
            Some(error) => Err(SocketError::Remote(error)),
            None => Ok(Payload::new(result)),
        };

        if self.pending.complete(id, outcome) {
            tracing::debug!(session = %self.config.id, id, "Command completed");
        } else {
            Counters::bump(&self.counters.unmatched_responses);
        }
    }

    fn route_event(&self, method: &str, params: Payload) {
        if self.events.dispatch(method, &params) == 0 {
            Counters::bump(&self.counters.unhandled_events);
            tracing::trace!(session = %self.config.id, method, "No handlers for event");
        }
    }

    /// Move to Closing, fail every pending call and drop all handlers.
    ///
    /// Never awaits: once this returns, nothing is left waiting on the
    /// caller. The read loop finishes the close in
    /// [`finish_close`](Self::finish_close). Returns `false` if some other
    /// path already started closing.
    fn begin_close(&self, termination: Termination) -> bool {
        let initiated = self.state.send_if_modified(|state| match state {
            SessionState::Connecting | SessionState::Open => {
                *state = SessionState::Closing;
                true
            }
            SessionState::Closing | SessionState::Closed => false,
        });
        if !initiated {
            return false;
        }

        let _ = self.shutdown_tx.try_send(());
        let drained = self.pending.drain_all(|| SocketError::SessionClosed);
        self.events.clear();

        tracing::debug!(session = %self.config.id, ?termination, drained, "Session closing");
        true
    }

    /// Release the connection and publish `Closed`. Runs on the read loop.
    async fn finish_close(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            tracing::warn!(session = %self.config.id, error = %e, "Error closing connection");
            *self.close_error.lock().await = Some(e);
        }

        self.state.send_replace(SessionState::Closed);
        tracing::info!(session = %self.config.id, "Session closed");
    }
}
