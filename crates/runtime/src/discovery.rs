//! HTTP discovery and the discovery-bootstrapped transport.
//!
//! Bootstrapping is two-phase: `GET /json/new` hands back a target whose
//! `webSocketDebuggerUrl` is then opened as the persistent socket. Both phases
//! complete before the session is considered open.

use std::sync::Arc;
use std::time::Duration;

use cdp_protocol::{BrowserVersion, TargetDescriptor};
use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, WebSocketTransport};

/// Runs `/json/{command}` requests against the discovery endpoint.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
	config: DiscoveryConfig,
	http: reqwest::Client,
}

impl DiscoveryClient {
	pub fn new(config: DiscoveryConfig) -> Self {
		Self::with_http_client(config, reqwest::Client::new())
	}

	/// Uses a preconfigured HTTP client (proxies, per-request timeouts).
	pub fn with_http_client(config: DiscoveryConfig, http: reqwest::Client) -> Self {
		Self { config, http }
	}

	pub fn config(&self) -> &DiscoveryConfig {
		&self.config
	}

	/// Opens a new target and returns its descriptor (`/json/new`).
	pub async fn new_target(&self) -> Result<TargetDescriptor> {
		self.json_command("new").await
	}

	/// Lists debuggable targets (`/json/list`).
	pub async fn list_targets(&self) -> Result<Vec<TargetDescriptor>> {
		self.json_command("list").await
	}

	/// Browser build information (`/json/version`).
	pub async fn version(&self) -> Result<BrowserVersion> {
		self.json_command("version").await
	}

	async fn json_command<T: DeserializeOwned>(&self, command: &str) -> Result<T> {
		let url = self.config.endpoint(command)?;
		debug!(target: "cdp", %url, "running discovery command");

		let response = self
			.http
			.get(url.clone())
			.send()
			.await
			.map_err(|e| Error::DiscoveryUnreachable(format!("{url}: {e}")))?;

		let status = response.status();
		debug!(target: "cdp", %url, status = status.as_u16(), "discovery responded");
		if status != StatusCode::OK {
			return Err(Error::DiscoveryFailed {
				status: status.as_u16(),
			});
		}

		response
			.json::<T>()
			.await
			.map_err(|e| Error::InvalidDiscoveryResponse(format!("{url}: {e}")))
	}
}

/// Transport that discovers a fresh target and opens its WebSocket.
///
/// The endpoint is resolved on every [`open`](Transport::open); nothing is
/// cached between connection attempts.
#[derive(Debug, Clone)]
pub struct DiscoveryTransport {
	client: DiscoveryClient,
}

impl DiscoveryTransport {
	pub fn new(config: DiscoveryConfig) -> Self {
		Self {
			client: DiscoveryClient::new(config),
		}
	}

	pub fn from_client(client: DiscoveryClient) -> Self {
		Self { client }
	}

	/// Discovery settings taken from the environment.
	pub fn from_env() -> Self {
		Self::new(DiscoveryConfig::from_env())
	}

	pub fn client(&self) -> &DiscoveryClient {
		&self.client
	}

	/// Creates a session and bootstraps it through this transport.
	///
	/// `timeout` bounds both phases together; `None` waits indefinitely.
	///
	/// # Errors
	///
	/// - [`Error::DiscoveryUnreachable`] if the endpoint cannot be reached
	/// - [`Error::DiscoveryFailed`] if it answers with a non-200 status
	/// - [`Error::InvalidDiscoveryResponse`] if the body names no socket
	/// - [`Error::TransportError`] if the socket fails before opening
	/// - [`Error::Timeout`] if `timeout` elapses first
	pub async fn connect(self, timeout: Option<Duration>) -> Result<Arc<Connection>> {
		let connection = Arc::new(Connection::new());
		connection.connect(self, timeout).await?;
		Ok(connection)
	}

	async fn open_socket(&self) -> Result<TransportParts> {
		let descriptor = self.client.new_target().await?;
		let url = descriptor.web_socket_debugger_url.ok_or_else(|| {
			Error::InvalidDiscoveryResponse(format!(
				"target {} has no webSocketDebuggerUrl",
				descriptor.id
			))
		})?;
		debug!(target: "cdp", id = %descriptor.id, %url, "websocket url acquired");

		WebSocketTransport::connect(&url).await
	}
}

impl Transport for DiscoveryTransport {
	fn open(&mut self) -> BoxFuture<'_, Result<TransportParts>> {
		Box::pin(self.open_socket())
	}
}
