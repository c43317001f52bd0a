//! Protocol message envelope.
//!
//! Every frame on the socket carries one JSON object of the shape
//! `{id?, method?, params?, result?, error?, sessionId?}`. Outbound commands are
//! [`Request`]s; inbound frames decode into a [`Message`], which is either a
//! [`Response`] (an `id` together with `result` or `error`) or an [`Event`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Command sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Request ID used to correlate the response.
	pub id: u64,
	/// Fully qualified method name, e.g. `Page.navigate`.
	pub method: String,
	/// Method parameters; omitted from the frame when `null`.
	#[serde(default, skip_serializing_if = "Value::is_null")]
	pub params: Value,
}

impl Request {
	pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
		Self {
			id,
			method: method.into(),
			params,
		}
	}
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
	pub id: u64,
	/// Present on replies that also name a method (not sent by Chrome, kept for routing).
	pub method: Option<String>,
	pub result: Option<Value>,
	pub error: Option<ErrorPayload>,
	pub session_id: Option<String>,
}

impl Response {
	/// Collapses the reply into the value or error it carries.
	pub fn into_outcome(self) -> Result<Value, ErrorPayload> {
		match self.error {
			Some(error) => Err(error),
			None => Ok(self.result.unwrap_or(Value::Null)),
		}
	}
}

/// Out-of-band notification.
///
/// A [`Response`] nobody is waiting for is also delivered as an event, with its
/// `id` preserved and its result (or error) as `params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
	/// Event name, e.g. `Page.loadEventFired`. Empty when the frame had none.
	pub method: String,
	pub params: Value,
	#[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	/// Set only for stray responses.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<u64>,
}

impl From<Response> for Event {
	fn from(response: Response) -> Self {
		let params = match response.error {
			Some(error) => serde_json::to_value(error).unwrap_or(Value::Null),
			None => response.result.unwrap_or(Value::Null),
		};
		Self {
			method: response.method.unwrap_or_default(),
			params,
			session_id: response.session_id,
			id: Some(response.id),
		}
	}
}

/// Decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	Response(Response),
	Event(Event),
}

/// Every field a frame may carry; classification happens after decoding.
#[derive(Debug, Deserialize)]
struct RawFrame {
	/// Anything but a non-negative integer leaves the frame unroutable as a response.
	#[serde(default)]
	id: Option<Value>,
	#[serde(default)]
	method: Option<String>,
	#[serde(default)]
	params: Option<Value>,
	#[serde(default)]
	result: Option<Value>,
	#[serde(default)]
	error: Option<ErrorPayload>,
	#[serde(default, rename = "sessionId")]
	session_id: Option<String>,
}

impl From<RawFrame> for Message {
	fn from(raw: RawFrame) -> Self {
		match raw.id.as_ref().and_then(Value::as_u64) {
			Some(id) if raw.result.is_some() || raw.error.is_some() => {
				Message::Response(Response {
					id,
					method: raw.method,
					result: raw.result,
					error: raw.error,
					session_id: raw.session_id,
				})
			}
			id => Message::Event(Event {
				method: raw.method.unwrap_or_default(),
				params: raw.params.unwrap_or(Value::Null),
				session_id: raw.session_id,
				id,
			}),
		}
	}
}

impl Message {
	/// Decodes one frame. The frame must hold a single JSON object.
	pub fn decode(frame: &[u8]) -> serde_json::Result<Self> {
		// Decoding through a map first keeps arrays from binding fields by position.
		let object: Map<String, Value> = serde_json::from_slice(frame)?;
		serde_json::from_value::<RawFrame>(Value::Object(object)).map(Message::from)
	}
}
