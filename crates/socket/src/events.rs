//! Event Registry
//!
//! Method name -> ordered list of handlers. Handlers run synchronously on
//! the read loop, in registration order. Nothing is ever unsubscribed
//! implicitly; the whole registry is cleared when the session closes.

use dashmap::DashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::protocol::Payload;

/// Receives events by method name with the payload still undecoded.
///
/// Decoding and reporting decode failures is the handler's job.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, method: &str, params: &Payload);
}

impl<F> EventHandler for F
where
    F: Fn(&str, &Payload) + Send + Sync,
{
    fn on_event(&self, method: &str, params: &Payload) {
        self(method, params)
    }
}

pub struct EventRegistry {
    handlers: DashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Append a handler for `method`
    pub fn register(&self, method: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let method = method.into();
        tracing::debug!(method = %method, "Registered event handler");
        self.handlers.entry(method).or_default().push(handler);
    }

    /// Closure form of [`register`](Self::register)
    pub fn subscribe<F>(&self, method: impl Into<String>, callback: F)
    where
        F: Fn(&str, &Payload) + Send + Sync + 'static,
    {
        self.register(method, Arc::new(callback));
    }

    /// Invoke every handler for `method`. Returns how many ran.
    ///
    /// The handler list is snapshotted first, so a handler may register
    /// more handlers without deadlocking; those see the next event.
    pub fn dispatch(&self, method: &str, params: &Payload) -> usize {
        let handlers = match self.handlers.get(method) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };

        for (index, handler) in handlers.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.on_event(method, params)));
            if outcome.is_err() {
                tracing::error!(method, index, "Event handler panicked");
            }
        }

        handlers.len()
    }

    pub fn handler_count(&self, method: &str) -> usize {
        self.handlers.get(method).map_or(0, |entry| entry.len())
    }

    pub fn clear(&self) {
        self.handlers.clear();
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
