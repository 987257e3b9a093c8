//! Remote Debugging Socket - Transport and Correlation Core
//!
//! Owns one persistent connection to a JSON-RPC style debugging endpoint.
//! Callers send named commands and await the matching response; the remote
//! pushes named events that fan out to registered handlers.
//!
//! # Layout
//!
//! ```text
//! wrapper -> Session::send_command -> codec::encode -> FrameSink
//!                     ^
//!             PendingCalls::complete
//!                     |
//! FrameStream -> read loop -> codec::decode -> response? / event?
//!                                                  |
//!                                        EventRegistry::dispatch
//! ```
//!
//! Payloads stay undecoded (`Payload`) until the wrapper or handler that
//! knows their shape decodes them.

pub mod codec;
pub mod command;
pub mod error;
pub mod events;
pub mod pending;
pub mod protocol;
pub mod session;
pub mod transport;

pub use command::{Ack, Command, Event};
pub use error::{Result, SocketError, TransportError};
pub use events::{EventHandler, EventRegistry};
pub use pending::PendingCalls;
pub use protocol::{Payload, RemoteError, RequestId};
pub use session::{Session, SessionConfig, SessionState, SessionStats};
