#![forbid(unsafe_code)]
#![doc = r#"
Chat2Anakin

Accept OpenAI Chat Completions requests and relay them to the Anakin chatbot
API, translating the request shape and the streaming reply back into the
Chat Completions wire format. Clients talk to `/v1/chat/completions` as if
this were an OpenAI endpoint.

Crate highlights
- Streaming relay with strict single-fire completion semantics (`session`).
- Incremental event-stream decoding of the upstream reply (`sse`).
- HTTP server (in `server`): `/v1/chat/completions` and `/status`.

Modules
- `models`: Data structures for the Chat Completions and Anakin APIs.
- `translate`: Mapping logic from Anakin replies to Chat shapes.
- `sse`: Event decoder and SSE frame encoders.
- `session`: Per-request stream session and its fire-once completion gate.
- `client`: Outbound Anakin client.
- `server`: Axum router/handlers (the binary uses this).
- `config`: Model-to-app-id mapping and endpoint settings.
- `util`: Shared helpers (tracing, env, HTTP client, app state).
"#]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod session;
pub mod sse;
pub mod translate;
pub mod util;

// Re-export the primary types for ergonomic library use.
pub use crate::client::AnakinClient;
pub use crate::config::RelayConfig;
pub use crate::error::RelayError;
pub use crate::session::StreamSession;

// Re-export model namespaces for convenience (downstream users can do `use chat2anakin::chat`).
pub use crate::models::{anakin, chat};
