//! Protocol connection: request/response correlation and event dispatch.
//!
//! The connection is transport-agnostic. It owns:
//! - the session state (`Idle -> Connecting -> Open -> Closed`)
//! - the outstanding-request table, keyed by monotonically increasing IDs
//! - the event subscriber registry
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::issue_command`] with a method and params
//! 2. The connection assigns the next ID and records a pending entry
//! 3. `{id, method, params}` is written to the transport as one frame
//! 4. The reader task hands each inbound frame to [`Connection::dispatch_raw_frame`]
//! 5. A response completes its pending entry; anything else goes to subscribers
//!
//! Tearing the session down fails every outstanding request exactly once.

mod events;
mod pending;
mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use cdp_protocol::{Event, Message, Request};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Mutex as TokioMutex, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub use events::{ANY_EVENT, EventHandler, EventWaiter, HandlerId, Subscription};
pub use pending::ResponseFuture;
pub use state::ConnectionState;

use self::events::EventRegistry;
use self::pending::{PendingRequest, SessionTable, SharedTable};
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportEvent, TransportParts, TransportReceiver, TransportSender};

/// Reason given to requests failed because the transport went away.
pub const TRANSPORT_CLOSED: &str = "transport closed";

/// Reason given to requests failed by [`Connection::close`].
pub const CLIENT_CLOSED: &str = "connection closed by client";

/// Reason given to requests still outstanding when the connection is dropped.
pub const CONNECTION_DROPPED: &str = "connection dropped";

/// One logical session with a debuggable target.
///
/// Create it, [`connect`](Self::connect) it over a [`Transport`], issue
/// commands while it is open, and [`close`](Self::close) it. A closed
/// connection cannot be reopened; create a new one instead.
pub struct Connection {
	/// Last request ID handed out; IDs start at 1.
	last_id: AtomicU64,
	table: SharedTable,
	state_tx: watch::Sender<ConnectionState>,
	/// Outbound half, present between a successful connect and `close()`.
	sender: TokioMutex<Option<Box<dyn TransportSender>>>,
	/// Reader task draining the inbound half.
	reader: Mutex<Option<JoinHandle<()>>>,
	events: EventRegistry,
}

impl Default for Connection {
	fn default() -> Self {
		Self::new()
	}
}

impl Connection {
	/// Creates an idle session.
	pub fn new() -> Self {
		let (state_tx, _) = watch::channel(ConnectionState::Idle);
		Self {
			last_id: AtomicU64::new(0),
			table: SessionTable::shared(),
			state_tx,
			sender: TokioMutex::new(None),
			reader: Mutex::new(None),
			events: EventRegistry::new(),
		}
	}

	pub fn state(&self) -> ConnectionState {
		self.table.lock().state
	}

	/// Receiver observing every state transition.
	pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
		self.state_tx.subscribe()
	}

	/// Resolves once the session is closed.
	pub async fn closed(&self) {
		let mut rx = self.state_tx.subscribe();
		let _ = rx.wait_for(|state| state.is_closed()).await;
	}

	/// Number of commands awaiting a response.
	pub fn pending_count(&self) -> usize {
		self.table.lock().pending.len()
	}

	/// Number of registered event handlers.
	pub fn subscriber_count(&self) -> usize {
		self.events.len()
	}

	/// Opens `transport` and starts dispatching its frames into this session.
	///
	/// The session moves to `Open` only after the transport reports open. Any
	/// failure (including the optional `timeout` elapsing) closes the session
	/// and is returned to the caller; there is no retry.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidState`] if the session is not idle, otherwise
	/// whatever the transport failed with, or [`Error::Timeout`].
	pub async fn connect<T>(self: &Arc<Self>, mut transport: T, timeout: Option<Duration>) -> Result<()>
	where
		T: Transport,
	{
		{
			let mut table = self.table.lock();
			if table.state != ConnectionState::Idle {
				return Err(Error::InvalidState(table.state));
			}
			self.set_state(&mut table, ConnectionState::Connecting);
		}
		debug!(target: "cdp", "connecting");

		let mut attempt = ConnectAttempt {
			connection: self,
			armed: true,
		};

		let opened = match timeout {
			Some(limit) => tokio::time::timeout(limit, transport.open())
				.await
				.unwrap_or_else(|_| {
					Err(Error::Timeout(format!(
						"transport did not open within {}ms",
						limit.as_millis()
					)))
				}),
			None => transport.open().await,
		};

		let TransportParts {
			mut sender,
			receiver,
		} = match opened {
			Ok(parts) => parts,
			Err(e) => {
				self.terminate(&format!("connect failed: {e}"));
				return Err(e);
			}
		};

		// Commands wait on the write lock, so none can observe `Open` before the sender is installed.
		let mut slot = self.sender.lock().await;
		let still_connecting = {
			let mut table = self.table.lock();
			let connecting = table.state == ConnectionState::Connecting;
			if connecting {
				self.set_state(&mut table, ConnectionState::Open);
			}
			connecting
		};
		if !still_connecting {
			drop(slot);
			let _ = sender.close().await;
			attempt.armed = false;
			return Err(Error::ConnectionClosed(
				"session terminated while connecting".to_string(),
			));
		}
		*slot = Some(sender);
		drop(slot);

		let reader = tokio::spawn(read_loop(Arc::downgrade(self), receiver));
		*self.reader.lock() = Some(reader);
		if self.state().is_closed() {
			if let Some(reader) = self.reader.lock().take() {
				reader.abort();
			}
		}

		attempt.armed = false;
		debug!(target: "cdp", "session open");
		Ok(())
	}

	/// Issues a command and waits for its result.
	///
	/// # Errors
	///
	/// - [`Error::NotConnected`] immediately if the session is not open
	/// - [`Error::Protocol`] if the browser rejected the command
	/// - [`Error::ConnectionClosed`] if the session ended while it was outstanding
	pub async fn issue_command(&self, method: &str, params: Value) -> Result<Value> {
		self.send_command(method, params).await?.await
	}

	/// Issues a command, giving up after `timeout`.
	///
	/// On expiry the pending entry is removed, so a late response is treated
	/// like any other unmatched frame.
	pub async fn issue_command_with_timeout(
		&self,
		method: &str,
		params: Value,
		timeout: Duration,
	) -> Result<Value> {
		let response = self.send_command(method, params).await?;
		let id = response.id();
		match tokio::time::timeout(timeout, response).await {
			Ok(result) => result,
			Err(_) => Err(Error::Timeout(format!(
				"{method} (id={id}) did not complete within {}ms",
				timeout.as_millis()
			))),
		}
	}

	/// Records and sends a command, returning a future for its result.
	///
	/// The future exposes the assigned [`id`](ResponseFuture::id), which can be
	/// passed to [`fail_pending`](Self::fail_pending) for external cancellation.
	pub async fn send_command(&self, method: &str, params: Value) -> Result<ResponseFuture> {
		let (tx, rx) = oneshot::channel();
		let id = {
			let mut table = self.table.lock();
			if !table.state.is_open() {
				return Err(Error::NotConnected);
			}
			let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
			table.pending.insert(
				id,
				PendingRequest {
					method: method.to_string(),
					tx,
				},
			);
			id
		};
		let response = ResponseFuture::new(id, rx, Arc::clone(&self.table));

		let frame = serde_json::to_string(&Request::new(id, method, params))?;
		trace!(target: "cdp", id, method, "=> browser");

		let mut sender = self.sender.lock().await;
		if self.state().is_closed() {
			// Already failed by terminate(); the future reports why.
			return Ok(response);
		}
		let Some(sender) = sender.as_mut() else {
			return Err(Error::ConnectionClosed(CLIENT_CLOSED.to_string()));
		};
		sender.send(frame).await?;
		Ok(response)
	}

	/// Force-completes an outstanding request with `error`.
	///
	/// Returns `false` if no request with that ID is outstanding.
	pub fn fail_pending(&self, id: u64, error: Error) -> bool {
		let pending = self.table.lock().pending.remove(&id);
		match pending {
			Some(pending) => {
				debug!(target: "cdp", id, method = %pending.method, error = %error, "request failed externally");
				let _ = pending.tx.send(Err(error));
				true
			}
			None => false,
		}
	}

	/// Decodes and routes one inbound frame.
	///
	/// A response completes its pending request exactly once; any other frame,
	/// including a response nobody waits for, is published to subscribers.
	/// Frames arriving after the session closed are ignored.
	///
	/// # Errors
	///
	/// Returns [`Error::Decode`] for a malformed frame. The session is unaffected.
	pub fn dispatch_raw_frame(&self, frame: &[u8]) -> Result<()> {
		if self.state().is_closed() {
			trace!(target: "cdp", "frame after close ignored");
			return Ok(());
		}

		let message = Message::decode(frame).map_err(|e| Error::Decode(e.to_string()))?;
		let event = match message {
			Message::Response(response) => {
				let pending = self.table.lock().pending.remove(&response.id);
				match pending {
					Some(pending) => {
						trace!(target: "cdp", id = response.id, method = %pending.method, "<= browser");
						let _ = pending.tx.send(response.into_outcome().map_err(Error::from));
						return Ok(());
					}
					None => {
						debug!(target: "cdp", id = response.id, "response has no pending request, publishing as event");
						Event::from(response)
					}
				}
			}
			Message::Event(event) => event,
		};

		trace!(target: "cdp", method = %event.method, "<= event");
		self.events.publish(&event);
		Ok(())
	}

	/// Registers `handler` for events named `event` (or [`ANY_EVENT`]).
	///
	/// Handlers for the same name run in registration order on the reader task.
	pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		self.events.subscribe(event, Arc::new(handler))
	}

	/// Removes a handler by ID. Returns `false` if it was not registered.
	pub fn unsubscribe(&self, id: HandlerId) -> bool {
		self.events.unsubscribe(id)
	}

	/// Waits for the next event named `event`.
	///
	/// The listener is registered before this returns, so an event triggered
	/// by a command issued afterwards is not missed.
	pub fn wait_for_event(&self, event: &str) -> EventWaiter {
		self.events.wait_for(event)
	}

	/// Closes the session, failing every outstanding request with
	/// [`Error::ConnectionClosed`] and dropping all event handlers.
	///
	/// Idempotent. The transport itself stays attached until [`close`](Self::close)
	/// or drop, but nothing is dispatched from it any more.
	pub fn terminate(&self, reason: &str) {
		let drained = {
			let mut table = self.table.lock();
			if table.state.is_closed() {
				return;
			}
			self.set_state(&mut table, ConnectionState::Closed);
			std::mem::take(&mut table.pending)
		};

		if let Some(reader) = self.reader.lock().take() {
			reader.abort();
		}
		self.events.close();

		debug!(target: "cdp", reason, outstanding = drained.len(), "session closed");
		for (id, pending) in drained {
			trace!(target: "cdp", id, method = %pending.method, "failing outstanding request");
			let _ = pending
				.tx
				.send(Err(Error::ConnectionClosed(reason.to_string())));
		}
	}

	/// Detaches the reader, terminates the session, then closes the transport.
	///
	/// # Errors
	///
	/// Returns [`Error::NotConnected`] if no transport is attached: `connect`
	/// never succeeded, or the connection was already closed.
	pub async fn close(&self) -> Result<()> {
		// Holding the write lock through terminate means no command sees a
		// missing sender while the session still reads as open.
		let mut slot = self.sender.lock().await;
		let mut sender = slot.take().ok_or(Error::NotConnected)?;

		let reader = self.reader.lock().take();
		if let Some(reader) = &reader {
			reader.abort();
		}
		self.terminate(CLIENT_CLOSED);
		drop(slot);

		if let Some(reader) = reader {
			let _ = reader.await;
		}
		if let Err(e) = sender.close().await {
			debug!(target: "cdp", error = %e, "transport close reported an error");
		}
		Ok(())
	}

	fn set_state(&self, table: &mut SessionTable, state: ConnectionState) {
		trace!(target: "cdp", from = %table.state, to = %state, "state transition");
		table.state = state;
		self.state_tx.send_replace(state);
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		// Response futures outlive the connection; fail them rather than leave them waiting.
		self.terminate(CONNECTION_DROPPED);
	}
}

/// Closes the session if a `connect` future is dropped before it finished.
struct ConnectAttempt<'a> {
	connection: &'a Connection,
	armed: bool,
}

impl Drop for ConnectAttempt<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.connection.terminate("connect cancelled");
		}
	}
}

/// Drains the inbound half of the transport into the session.
///
/// Ends when the transport closes or fails, which terminates the session.
async fn read_loop(connection: Weak<Connection>, mut receiver: Box<dyn TransportReceiver>) {
	loop {
		let event = receiver.recv().await;
		let Some(connection) = connection.upgrade() else {
			return;
		};

		match event {
			Some(TransportEvent::Frame(frame)) => {
				if let Err(e) = connection.dispatch_raw_frame(&frame) {
					warn!(target: "cdp", error = %e, "dropping inbound frame");
				}
			}
			Some(TransportEvent::Closed(reason)) => {
				debug!(target: "cdp", reason = reason.as_deref().unwrap_or(""), "transport closed by peer");
				break;
			}
			Some(TransportEvent::Error(e)) => {
				warn!(target: "cdp", error = %e, "transport error");
				break;
			}
			None => break,
		}
	}

	if let Some(connection) = connection.upgrade() {
		connection.terminate(TRANSPORT_CLOSED);
	}
}
