//! Event subscriber registry.
//!
//! Handlers live in an [`IndexMap`] keyed by [`HandlerId`], so removal is cheap
//! and iteration follows registration order.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use cdp_protocol::Event;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Event name matching every event.
pub const ANY_EVENT: &str = "*";

/// Unique identifier for event handlers within one connection.
pub type HandlerId = u64;

/// Handler invoked on the reader task for each matching event.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

struct HandlerEntry {
	event: String,
	handler: EventHandler,
}

#[derive(Default)]
struct HandlerTable {
	closed: bool,
	entries: IndexMap<HandlerId, HandlerEntry>,
}

pub(crate) struct EventRegistry {
	handlers: Arc<Mutex<HandlerTable>>,
	next_id: AtomicU64,
}

impl EventRegistry {
	pub fn new() -> Self {
		Self {
			handlers: Arc::new(Mutex::new(HandlerTable::default())),
			next_id: AtomicU64::new(1),
		}
	}

	/// Registers `handler` for `event`. After [`close`](Self::close) the handler
	/// is dropped immediately and the returned subscription is inert.
	pub fn subscribe(&self, event: &str, handler: EventHandler) -> Subscription {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let mut table = self.handlers.lock();
		if !table.closed {
			table.entries.insert(
				id,
				HandlerEntry {
					event: event.to_string(),
					handler,
				},
			);
		}
		Subscription {
			id,
			handlers: Arc::downgrade(&self.handlers),
		}
	}

	pub fn unsubscribe(&self, id: HandlerId) -> bool {
		self.handlers.lock().entries.shift_remove(&id).is_some()
	}

	/// Invokes every matching handler in registration order and returns how many ran.
	///
	/// Handlers run outside the lock, so they may (un)subscribe freely.
	pub fn publish(&self, event: &Event) -> usize {
		let matching: Vec<EventHandler> = self
			.handlers
			.lock()
			.entries
			.values()
			.filter(|entry| entry.event == ANY_EVENT || entry.event == event.method)
			.map(|entry| Arc::clone(&entry.handler))
			.collect();

		for handler in &matching {
			handler(event);
		}
		matching.len()
	}

	/// Drops every handler and refuses new ones.
	pub fn close(&self) {
		let entries = {
			let mut table = self.handlers.lock();
			table.closed = true;
			std::mem::take(&mut table.entries)
		};
		drop(entries);
	}

	pub fn len(&self) -> usize {
		self.handlers.lock().entries.len()
	}

	/// One-shot listener; registered before this returns.
	pub fn wait_for(&self, event: &str) -> EventWaiter {
		let (tx, rx) = oneshot::channel();
		let slot = Mutex::new(Some(tx));
		let subscription = self.subscribe(
			event,
			Arc::new(move |event: &Event| {
				if let Some(tx) = slot.lock().take() {
					let _ = tx.send(event.clone());
				}
			}),
		);
		EventWaiter {
			rx,
			_subscription: subscription,
		}
	}
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the registry, so dropping it after the
/// connection is gone is a no-op.
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
	id: HandlerId,
	handlers: Weak<Mutex<HandlerTable>>,
}

impl Subscription {
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Unregisters the handler now.
	pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(handlers) = self.handlers.upgrade() {
			handlers.lock().entries.shift_remove(&self.id);
		}
	}
}

/// Resolves with the first event of a given name.
///
/// Fails with [`Error::ConnectionClosed`] if the session terminates first.
pub struct EventWaiter {
	rx: oneshot::Receiver<Event>,
	_subscription: Subscription,
}

impl Future for EventWaiter {
	type Output = Result<Event>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx).poll(cx).map(|result| {
			result.map_err(|_| {
				Error::ConnectionClosed("session terminated before the event arrived".to_string())
			})
		})
	}
}
