use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("params must be a JSON value: {0}")]
	InvalidParams(#[source] serde_json::Error),

	#[error("timeout after {ms}ms waiting for: {operation}")]
	Timeout { ms: u64, operation: &'static str },

	#[error(transparent)]
	Runtime(#[from] cdp_runtime::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}
