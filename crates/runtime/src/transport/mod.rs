//! Transport capability consumed by [`Connection`](crate::Connection).
//!
//! A transport is split into two halves once it is open:
//! - [`TransportSender`] writes one outbound frame per call
//! - [`TransportReceiver`] yields inbound frames and lifecycle notifications
//!
//! The connection owns both halves: the sender sits behind its write lock and
//! the receiver is drained by a single reader task. Socket listeners are thus
//! plain values, detached by dropping them.

mod websocket;

use futures_util::future::BoxFuture;

use crate::error::Result;

pub use websocket::{WebSocketReceiver, WebSocketSender, WebSocketTransport};

/// What the receiving half observed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	/// One complete inbound message.
	Frame(Vec<u8>),
	/// The peer closed the channel, with its close reason if one was sent.
	Closed(Option<String>),
	/// The channel failed; no further events follow.
	Error(String),
}

/// Outbound half of an open transport.
pub trait TransportSender: Send {
	/// Sends one frame verbatim, without buffering or batching.
	fn send(&mut self, frame: String) -> BoxFuture<'_, Result<()>>;

	/// Closes the underlying channel.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Inbound half of an open transport.
pub trait TransportReceiver: Send {
	/// Waits for the next event. `None` means the channel is exhausted.
	fn recv(&mut self) -> BoxFuture<'_, Option<TransportEvent>>;
}

/// Both halves of an open transport.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub receiver: Box<dyn TransportReceiver>,
}

/// A way of reaching a debuggable target.
pub trait Transport: Send {
	/// Establishes the channel. Resolves only once the peer accepted it.
	fn open(&mut self) -> BoxFuture<'_, Result<TransportParts>>;
}
