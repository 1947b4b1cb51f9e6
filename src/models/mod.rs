//! Data models for the two wire formats the relay bridges.
//!
//! This module groups two submodules:
//! - `chat`: Types representing the OpenAI Chat Completions request/response
//!   subset the relay accepts and emits.
//! - `anakin`: Types for the Anakin chatbot messages API the relay calls.
//!
//! The mapping logic between the two lives in `crate::translate`.

pub mod anakin;
pub mod chat;

// Optional convenience re-exports for downstream users.
pub use anakin::{AnakinMessageRequest, AnakinReply};
pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role,
};
