use std::time::Duration;

use clap::Parser;

use super::*;

#[test]
fn parse_send_command_with_params() {
	let args = vec!["cdp", "send", "Page.navigate", r#"{"url":"https://example.com"}"#];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Send { method, params } => {
			assert_eq!(method, "Page.navigate");
			assert_eq!(params.as_deref(), Some(r#"{"url":"https://example.com"}"#));
		}
		_ => panic!("Expected Send command"),
	}
}

#[test]
fn parse_send_without_params() {
	let cli = Cli::try_parse_from(["cdp", "send", "Browser.getVersion"]).unwrap();

	match cli.command {
		Commands::Send { params, .. } => assert!(params.is_none()),
		_ => panic!("Expected Send command"),
	}
}

#[test]
fn parse_watch_with_enable() {
	let args = [
		"cdp",
		"watch",
		"Page.loadEventFired",
		"Network.requestWillBeSent",
		"--enable",
		"Page",
		"--enable",
		"Network",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Watch { events, enable } => {
			assert_eq!(events, vec!["Page.loadEventFired", "Network.requestWillBeSent"]);
			assert_eq!(enable, vec!["Page", "Network"]);
		}
		_ => panic!("Expected Watch command"),
	}
}

#[test]
fn watch_requires_an_event() {
	assert!(Cli::try_parse_from(["cdp", "watch"]).is_err());
}

#[test]
fn global_flags_override_config() {
	let cli = Cli::try_parse_from([
		"cdp",
		"targets",
		"--host",
		"10.0.0.5",
		"--port",
		"9333",
		"--timeout-ms",
		"1500",
		"-vv",
	])
	.unwrap();

	let config = cli.discovery_config();
	assert_eq!(config.host, "10.0.0.5");
	assert_eq!(config.port, 9333);
	assert_eq!(cli.timeout(), Some(Duration::from_millis(1500)));
	assert_eq!(cli.verbose, 2);
}

#[test]
fn verbosity_filters() {
	assert_eq!(crate::logging::default_filter(0), "warn");
	assert_eq!(crate::logging::default_filter(1), "info,cdp=debug");
	assert_eq!(crate::logging::default_filter(5), "debug,cdp=trace");
}
