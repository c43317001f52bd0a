use std::time::Duration;

use cdp_runtime::DiscoveryConfig;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cdp")]
#[command(about = "Talk to a browser over the remote-debugging protocol")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v lifecycle, -vv every frame)
	#[arg(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	/// Discovery host [env: CDP_HOST] [default: localhost]
	#[arg(long, global = true)]
	pub host: Option<String>,

	/// Discovery port [env: CDP_PORT, PORT] [default: 9222]
	#[arg(long, global = true)]
	pub port: Option<u16>,

	/// Give up on discovery, connect, or a command after this many milliseconds
	#[arg(long, global = true, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Print browser version information from /json/version
	Version,

	/// List debuggable targets from /json/list
	Targets,

	/// Open a new target, issue one command, and print its result
	Send {
		/// Method name, e.g. Browser.getVersion
		method: String,

		/// Parameters as a JSON object
		params: Option<String>,
	},

	/// Open a new target and print matching events as JSON lines
	Watch {
		/// Event names to print ("*" for all)
		#[arg(required = true)]
		events: Vec<String>,

		/// Call <DOMAIN>.enable before watching (repeatable)
		#[arg(long = "enable", value_name = "DOMAIN")]
		enable: Vec<String>,
	},
}

impl Cli {
	/// Environment settings with command-line overrides applied.
	pub fn discovery_config(&self) -> DiscoveryConfig {
		let mut config = DiscoveryConfig::from_env();
		if let Some(host) = &self.host {
			config.host = host.clone();
		}
		if let Some(port) = self.port {
			config.port = port;
		}
		config
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_ms.map(Duration::from_millis)
	}
}

#[cfg(test)]
mod tests;
