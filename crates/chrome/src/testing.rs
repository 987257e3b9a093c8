//! Test harness: a session wired to an in-memory remote

use serde_json::Value;
use socket::transport::memory::{self, RemoteEnd};
use socket::{Session, SessionConfig};
use std::sync::Arc;

pub fn connect() -> (Arc<Session>, RemoteEnd) {
    let (sink, frames, remote) = memory::pair();
    let session = Session::start(SessionConfig::default(), sink, frames);
    (session, remote)
}

/// Take the next command off the wire, answer it with `result`, return it
pub async fn answer(remote: &mut RemoteEnd, result: Value) -> Value {
    let command = remote
        .next_command()
        .await
        .expect("session wrote no command");
    let id = command["id"].as_u64().expect("command without id");
    remote.respond(id, result);
    command
}

/// Wait until the session's read loop has seen `n` frames
pub async fn frames_handled(session: &Session, n: u64) {
    while session.stats().frames_received < n {
        tokio::task::yield_now().await;
    }
}
