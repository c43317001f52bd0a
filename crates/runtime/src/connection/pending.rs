//! Outstanding-request table and the future handed back to callers.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use super::ConnectionState;
use crate::error::{Error, Result};

/// One in-flight command.
pub(crate) struct PendingRequest {
	pub method: String,
	pub tx: oneshot::Sender<Result<Value>>,
}

/// State and pending requests, guarded together so that the state check,
/// insert, lookup-and-remove and drain are each a single atomic step.
pub(crate) struct SessionTable {
	pub state: ConnectionState,
	pub pending: HashMap<u64, PendingRequest>,
}

pub(crate) type SharedTable = Arc<Mutex<SessionTable>>;

impl SessionTable {
	pub fn shared() -> SharedTable {
		Arc::new(Mutex::new(Self {
			state: ConnectionState::Idle,
			pending: HashMap::new(),
		}))
	}
}

/// RAII guard removing the pending entry when the response future is dropped early.
struct CancelGuard {
	id: u64,
	table: SharedTable,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		if self.table.lock().pending.remove(&self.id).is_some() {
			tracing::debug!(target: "cdp", id = self.id, "removed abandoned request");
		}
	}
}

/// Resolves with the result of one command.
///
/// Returned by [`Connection::send_command`](super::Connection::send_command).
/// Dropping it before completion forgets the request; a late response for its
/// id is then delivered to event subscribers instead.
#[must_use = "the command result is only observed by awaiting the future"]
pub struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl ResponseFuture {
	pub(crate) fn new(id: u64, rx: oneshot::Receiver<Result<Value>>, table: SharedTable) -> Self {
		Self {
			rx,
			guard: CancelGuard {
				id,
				table,
				completed: false,
			},
		}
	}

	/// Request ID assigned to this command.
	pub fn id(&self) -> u64 {
		self.guard.id
	}
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.completed = true;
				Poll::Ready(result.unwrap_or_else(|_| {
					Err(Error::ConnectionClosed(super::CONNECTION_DROPPED.to_string()))
				}))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}
