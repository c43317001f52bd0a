//! Remote-debugging protocol runtime - connection, transport, and discovery
//!
//! This crate provides the session layer for talking to a debuggable browser:
//!
//! - **Connection**: request/response correlation, session state, event dispatch
//! - **Transport**: the capability a connection is composed over
//! - **Discovery**: HTTP `/json/*` bootstrap followed by a WebSocket
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │      Connection      │  ids, pending table, subscribers
//! └──────────┬───────────┘
//!            │ Transport (open / send / recv)
//! ┌──────────▼───────────┐
//! │  DiscoveryTransport  │  GET /json/new, then WebSocket
//! └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let connection = DiscoveryTransport::from_env().connect(None).await?;
//! let _sub = connection.subscribe("Page.loadEventFired", |event| println!("{}", event.params));
//! connection.issue_command("Page.enable", serde_json::Value::Null).await?;
//! connection.issue_command("Page.navigate", json!({"url": "https://example.com"})).await?;
//! connection.close().await?;
//! ```

pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod transport;

pub use cdp_protocol::{Event, Request};
pub use config::{DEFAULT_HOST, DEFAULT_PORT, DiscoveryConfig};
pub use connection::{
	ANY_EVENT, CLIENT_CLOSED, CONNECTION_DROPPED, Connection, ConnectionState, EventHandler,
	EventWaiter, HandlerId, ResponseFuture, Subscription, TRANSPORT_CLOSED,
};
pub use discovery::{DiscoveryClient, DiscoveryTransport};
pub use error::{Error, Result};
pub use transport::{
	Transport, TransportEvent, TransportParts, TransportReceiver, TransportSender,
	WebSocketReceiver, WebSocketSender, WebSocketTransport,
};
