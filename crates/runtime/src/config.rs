//! Discovery endpoint configuration.

use tracing::warn;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9222;

/// Where the HTTP discovery endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
	pub host: String,
	pub port: u16,
}

impl Default for DiscoveryConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			port: DEFAULT_PORT,
		}
	}
}

impl DiscoveryConfig {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
		}
	}

	/// Reads `CDP_HOST` and `CDP_PORT` (falling back to `PORT`) from the environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Like [`from_env`](Self::from_env), with a custom variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(host) = lookup("CDP_HOST").filter(|h| !h.trim().is_empty()) {
			config.host = host.trim().to_string();
		}

		if let Some(raw) = lookup("CDP_PORT").or_else(|| lookup("PORT")) {
			match raw.trim().parse::<u16>() {
				Ok(port) => config.port = port,
				Err(_) => warn!(target: "cdp", value = %raw, "ignoring invalid port, using {}", DEFAULT_PORT),
			}
		}

		config
	}

	/// URL of the discovery command `command`, e.g. `new` -> `http://host:port/json/new`.
	pub fn endpoint(&self, command: &str) -> Result<Url> {
		let host = if self.host.contains(':') && !self.host.starts_with('[') {
			format!("[{}]", self.host)
		} else {
			self.host.clone()
		};

		Url::parse(&format!("http://{host}:{}/json/{command}", self.port))
			.map_err(|e| Error::DiscoveryUnreachable(format!("invalid address {host}:{}: {e}", self.port)))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key: &str| vars.get(key).cloned()
	}

	#[test]
	fn test_defaults() {
		let config = DiscoveryConfig::from_lookup(lookup(&[]));
		assert_eq!(config, DiscoveryConfig::new("localhost", 9222));
	}

	#[test]
	fn test_port_fallback_order() {
		let config = DiscoveryConfig::from_lookup(lookup(&[("PORT", "9333")]));
		assert_eq!(config.port, 9333);

		let config = DiscoveryConfig::from_lookup(lookup(&[("PORT", "9333"), ("CDP_PORT", "9444")]));
		assert_eq!(config.port, 9444);
	}

	#[test]
	fn test_invalid_port_keeps_default() {
		let config = DiscoveryConfig::from_lookup(lookup(&[("CDP_PORT", "not-a-port")]));
		assert_eq!(config.port, DEFAULT_PORT);
	}

	#[test]
	fn test_endpoint_url() {
		let config = DiscoveryConfig::new("127.0.0.1", 9222);
		assert_eq!(
			config.endpoint("new").unwrap().as_str(),
			"http://127.0.0.1:9222/json/new"
		);
	}

	#[test]
	fn test_endpoint_brackets_ipv6() {
		let config = DiscoveryConfig::new("::1", 9222);
		assert_eq!(
			config.endpoint("version").unwrap().as_str(),
			"http://[::1]:9222/json/version"
		);
	}
}
