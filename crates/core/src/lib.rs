//! Core logic including the completion loop, stream decoding and tool
//! execution.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
pub mod conversation;
mod error;
mod model_client;
pub mod stream;
pub mod tool;

pub use client::{ChatClient, ChatClientBuilder};
pub use conversation::Conversation;
pub use error::Error;
pub use toolchat_model::{Message, Role, ToolCall};
