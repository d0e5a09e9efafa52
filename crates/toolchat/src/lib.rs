//! A terminal chat that manages a user directory through tool calls.
//!
//! The binary wires [`toolchat_core::ChatClient`] to a DIAL deployment and
//! the tools in [`tools`]. The tools are exposed so that other hosts can
//! register them on their own clients.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod input;
pub mod tools;
