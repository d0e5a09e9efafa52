//! An abstraction layer for chat-completion models.
//!
//! This crate establishes an unified protocol for the chat client to
//! interact with streaming completion endpoints, so that the client can
//! switch between them without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod request;
mod response;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use request::*;
pub use response::*;
