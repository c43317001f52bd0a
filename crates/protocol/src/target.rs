//! Descriptors returned by the HTTP discovery endpoint (`/json/*`).

use serde::{Deserialize, Serialize};

/// One debuggable target, as returned by `/json/new` and `/json/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
	pub id: String,
	#[serde(rename = "type", default)]
	pub target_type: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	/// Missing when another client is already attached to the target.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web_socket_debugger_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub devtools_frontend_url: Option<String>,
}

/// Browser build information from `/json/version`.
///
/// Chrome spells most of these keys with dashes and capitals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserVersion {
	#[serde(rename = "Browser")]
	pub browser: String,
	#[serde(rename = "Protocol-Version")]
	pub protocol_version: String,
	#[serde(rename = "User-Agent", default)]
	pub user_agent: String,
	#[serde(rename = "V8-Version", default, skip_serializing_if = "Option::is_none")]
	pub v8_version: Option<String>,
	#[serde(rename = "webSocketDebuggerUrl", default, skip_serializing_if = "Option::is_none")]
	pub web_socket_debugger_url: Option<String>,
}
