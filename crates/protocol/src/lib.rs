//! Wire types for the remote-debugging protocol.
//!
//! Only the generic envelope is modelled here: command requests, response and
//! event classification, and the descriptors handed out by the HTTP discovery
//! endpoint. Domain-specific commands and events stay as raw JSON.

pub mod message;
pub mod target;

pub use message::{ErrorPayload, Event, Message, Request, Response};
pub use target::{BrowserVersion, TargetDescriptor};
