use std::fmt;

/// Lifecycle of a session: `Idle -> Connecting -> Open -> Closed`.
///
/// `Closed` is reachable from every state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
	Idle,
	Connecting,
	Open,
	Closed,
}

impl ConnectionState {
	pub fn is_open(self) -> bool {
		self == ConnectionState::Open
	}

	pub fn is_closed(self) -> bool {
		self == ConnectionState::Closed
	}
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ConnectionState::Idle => "idle",
			ConnectionState::Connecting => "connecting",
			ConnectionState::Open => "open",
			ConnectionState::Closed => "closed",
		};
		f.write_str(name)
	}
}
