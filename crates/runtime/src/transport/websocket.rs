//! WebSocket transport built on `tokio-tungstenite`.

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use super::{Transport, TransportEvent, TransportParts, TransportReceiver, TransportSender};
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport for an already known `ws://` or `wss://` endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
	url: String,
}

impl WebSocketTransport {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// Performs the handshake and splits the socket into its two halves.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		debug!(target: "cdp", url, "opening web socket");
		let (stream, _) = tokio_tungstenite::connect_async(url)
			.await
			.map_err(|e| Error::TransportError(format!("{url}: {e}")))?;
		debug!(target: "cdp", url, "web socket opened");

		let (sink, source) = stream.split();
		Ok(TransportParts {
			sender: Box::new(WebSocketSender { sink }),
			receiver: Box::new(WebSocketReceiver { source }),
		})
	}
}

impl Transport for WebSocketTransport {
	fn open(&mut self) -> BoxFuture<'_, Result<TransportParts>> {
		Box::pin(Self::connect(&self.url))
	}
}

/// Writing half of a WebSocket.
pub struct WebSocketSender {
	sink: SplitSink<WsStream, Message>,
}

impl TransportSender for WebSocketSender {
	fn send(&mut self, frame: String) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			trace!(target: "cdp", %frame, "ws send");
			self.sink.send(Message::Text(frame)).await?;
			Ok(())
		})
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.sink.close().await?;
			Ok(())
		})
	}
}

/// Reading half of a WebSocket.
pub struct WebSocketReceiver {
	source: SplitStream<WsStream>,
}

impl TransportReceiver for WebSocketReceiver {
	fn recv(&mut self) -> BoxFuture<'_, Option<TransportEvent>> {
		Box::pin(async move {
			loop {
				let message = match self.source.next().await? {
					Ok(message) => message,
					Err(e) => return Some(TransportEvent::Error(e.to_string())),
				};

				match message {
					Message::Text(text) => return Some(TransportEvent::Frame(text.into_bytes())),
					Message::Binary(bytes) => return Some(TransportEvent::Frame(bytes)),
					Message::Close(frame) => {
						return Some(TransportEvent::Closed(
							frame.map(|f| f.reason.into_owned()),
						));
					}
					// Control frames are answered by tungstenite itself.
					Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
				}
			}
		})
	}
}
