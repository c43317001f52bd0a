//! Subcommand implementations.

use std::future::Future;
use std::time::Duration;

use cdp_protocol::Event;
use cdp_runtime::{Connection, DiscoveryClient, DiscoveryTransport, Error as RuntimeError, Subscription};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = cli.discovery_config();
	let timeout = cli.timeout();
	debug!(host = %config.host, port = config.port, "using discovery endpoint");

	match cli.command {
		Commands::Version => {
			let client = DiscoveryClient::new(config);
			let version = bounded(timeout, "/json/version", client.version()).await??;
			print_json(&serde_json::to_value(version)?)
		}
		Commands::Targets => {
			let client = DiscoveryClient::new(config);
			let targets = bounded(timeout, "/json/list", client.list_targets()).await??;
			print_json(&serde_json::to_value(targets)?)
		}
		Commands::Send { method, params } => {
			let params = parse_params(params.as_deref())?;
			let connection = DiscoveryTransport::new(config).connect(timeout).await?;
			let result = issue(&connection, &method, params, timeout).await;
			close_quietly(&connection).await;
			print_json(&result?)
		}
		Commands::Watch { events, enable } => {
			let connection = DiscoveryTransport::new(config).connect(timeout).await?;
			let result = watch(&connection, &events, &enable, timeout).await;
			close_quietly(&connection).await;
			result
		}
	}
}

/// Parses the optional params argument; absent means no params.
pub fn parse_params(raw: Option<&str>) -> Result<Value> {
	match raw {
		None => Ok(Value::Null),
		Some(text) => serde_json::from_str(text).map_err(CliError::InvalidParams),
	}
}

async fn issue(
	connection: &Connection,
	method: &str,
	params: Value,
	timeout: Option<Duration>,
) -> Result<Value> {
	let result = match timeout {
		Some(limit) => {
			connection
				.issue_command_with_timeout(method, params, limit)
				.await
		}
		None => connection.issue_command(method, params).await,
	};
	Ok(result?)
}

async fn watch(
	connection: &Connection,
	events: &[String],
	enable: &[String],
	timeout: Option<Duration>,
) -> Result<()> {
	let _subscriptions: Vec<Subscription> = events
		.iter()
		.map(|name| connection.subscribe(name, print_event))
		.collect();

	for domain in enable {
		issue(connection, &format!("{domain}.enable"), Value::Null, timeout).await?;
		info!(domain = %domain, "domain enabled");
	}

	tokio::select! {
		_ = connection.closed() => info!("target closed the connection"),
		signal = tokio::signal::ctrl_c() => signal?,
	}
	Ok(())
}

fn print_event(event: &Event) {
	match serde_json::to_string(event) {
		Ok(line) => println!("{line}"),
		Err(e) => debug!(error = %e, "failed to serialize event"),
	}
}

fn print_json(value: &Value) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

async fn close_quietly(connection: &Connection) {
	match connection.close().await {
		Ok(()) | Err(RuntimeError::NotConnected) => {}
		Err(e) => debug!(error = %e, "close failed"),
	}
}

/// Applies the optional caller timeout to a discovery-only operation.
async fn bounded<F, T>(timeout: Option<Duration>, operation: &'static str, fut: F) -> Result<T>
where
	F: Future<Output = T>,
{
	match timeout {
		Some(limit) => tokio::time::timeout(limit, fut)
			.await
			.map_err(|_| CliError::Timeout {
				ms: limit.as_millis() as u64,
				operation,
			}),
		None => Ok(fut.await),
	}
}
