//! Error types for the connection runtime.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the connection, its transports, and discovery.
///
/// Only [`Error::Decode`] is absorbed internally (the reader logs and drops the
/// frame); every other kind reaches the caller of the affected operation.
#[derive(Debug, Error)]
pub enum Error {
	/// Command issued while the session is not open, or `close()` with no transport attached.
	#[error("Not connected: the session is not open")]
	NotConnected,

	/// Lifecycle operation attempted from the wrong state.
	#[error("Invalid session state: {0}")]
	InvalidState(ConnectionState),

	/// Discovery endpoint answered with a non-success status.
	#[error("Discovery failed with HTTP status {status}")]
	DiscoveryFailed { status: u16 },

	/// Discovery endpoint could not be reached at all.
	#[error("Discovery endpoint unreachable: {0}. Start the browser with --remote-debugging-port")]
	DiscoveryUnreachable(String),

	/// Discovery answered, but the body was not usable.
	#[error("Invalid discovery response: {0}")]
	InvalidDiscoveryResponse(String),

	/// Socket-level failure while opening or writing.
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Session was torn down while the request was outstanding.
	#[error("Connection closed: {0}")]
	ConnectionClosed(String),

	/// Inbound frame could not be decoded.
	#[error("Failed to decode frame: {0}")]
	Decode(String),

	/// Protocol-level error returned by the browser.
	#[error("Protocol error {code}: {message}")]
	Protocol {
		code: i64,
		message: String,
		data: Option<serde_json::Value>,
	},

	/// Caller-supplied timeout elapsed.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// JSON serialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if the session was torn down underneath the operation.
	pub fn is_connection_closed(&self) -> bool {
		matches!(self, Error::ConnectionClosed(_))
	}

	/// Returns the protocol error code, if the browser rejected the command.
	pub fn protocol_code(&self) -> Option<i64> {
		match self {
			Error::Protocol { code, .. } => Some(*code),
			_ => None,
		}
	}
}

impl From<cdp_protocol::ErrorPayload> for Error {
	fn from(payload: cdp_protocol::ErrorPayload) -> Self {
		Error::Protocol {
			code: payload.code,
			message: payload.message,
			data: payload.data,
		}
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::TransportError(e.to_string())
	}
}
