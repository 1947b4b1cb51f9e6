//! Stream session: bridges one upstream event sequence to one downstream
//! client connection with strict single-fire completion semantics.
//!
//! The upstream fetch runs on its own task while the HTTP runtime drains the
//! response body; the two sides must agree on exactly one terminal outcome.
//! A naive "completed" boolean checked then set would race when a clean
//! upstream close and a connection error land concurrently, double-writing
//! the terminal frame or leaving the exchange open forever. The gate here is
//! an atomic consume: terminal paths `take()` the sink sender out of a
//! mutex, and only the path that gets it writes the final frame and closes
//! the channel. Closing the channel is the completion latch: the response
//! body ends, and the inbound exchange with it, exactly when the gate fires.

use crate::error::RelayError;
use crate::sse::{data_frame, done_frame, error_frame};
use crate::translate::{chunk_from_payload, completion_id};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// The unit of work for one streaming request.
///
/// Owns the downstream sink for its whole lifetime; exactly one session
/// exists per streaming request and it is never reused.
pub struct StreamSession {
    id: String,
    model: String,
    /// Live sink, or `None` once the terminal signal has fired.
    sink: Mutex<Option<UnboundedSender<Bytes>>>,
}

impl StreamSession {
    /// Open a session for `model`. The returned receiver is the downstream
    /// sink; it becomes the HTTP response body and stays open until the
    /// session fires its terminal signal.
    pub fn open(model: &str) -> (Arc<Self>, UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            id: completion_id(),
            model: model.to_string(),
            sink: Mutex::new(Some(tx)),
        });
        (session, rx)
    }

    /// Stable per-session identifier carried by every emitted chunk.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle one decoded upstream payload: translate it and, if a chunk
    /// results, write it as a `data:` frame. Malformed payloads are dropped
    /// silently. A no-op after the terminal signal has fired.
    pub fn on_event(&self, payload: &str) {
        if let Some(json) = chunk_from_payload(payload, &self.id, &self.model) {
            // Send failure means the client went away; best-effort.
            if let Some(tx) = self.sink.lock().as_ref() {
                let _ = tx.send(data_frame(&json));
            }
        }
    }

    /// Upstream ended cleanly: write the final `[DONE]` frame and fire the
    /// latch. Idempotent: the first invocation consumes the sink, later
    /// ones find nothing to do.
    pub fn on_complete(&self) {
        if let Some(tx) = self.sink.lock().take() {
            let _ = tx.send(done_frame());
        }
    }

    /// Upstream failed: write a diagnostic frame and fire the latch.
    /// Mutually exclusive with [`on_complete`](Self::on_complete): whichever
    /// takes the sink first wins; the other is suppressed.
    pub fn on_error(&self, err: &RelayError) {
        if let Some(tx) = self.sink.lock().take() {
            let _ = tx.send(error_frame(&err.to_string()));
        }
    }

    /// True once the terminal signal has fired or the client receiver is
    /// gone. The upstream driver uses this to stop reading after a client
    /// disconnect, dropping (and thereby cancelling) the upstream fetch.
    pub fn is_closed(&self) -> bool {
        match self.sink.lock().as_ref() {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}
