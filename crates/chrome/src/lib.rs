//! Protocol Domain Wrappers
//!
//! One module per protocol domain. Every command is a params struct that
//! implements [`socket::Command`]; every event a struct that implements
//! [`socket::Event`]. The functions here just build the command, hand it to
//! the shared [`Session`] and return the decoded result.
//!
//! ```text
//! layer_tree::make_snapshot(&session, &params)
//!     -> Session::execute -> wire -> MakeSnapshotResult
//! ```
//!
//! No validation happens at this layer. Whatever the remote says is wrong
//! comes back as `SocketError::Remote`.

pub mod layer_tree;
pub mod service_worker;
pub mod system_info;
pub mod types;

#[cfg(test)]
mod testing;

pub use socket::{Result, Session, SessionConfig, SocketError};
pub use types::Rect;
