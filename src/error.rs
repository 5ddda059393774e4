use thiserror::Error;

use crate::model::HubError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
	/// The hub answered the download request with an HTTP-level failure.
	/// The original error stays reachable through `source()`.
	#[error("Error downloading model: Model {model} could not be downloaded")]
	DownloadFailed {
		model: String,
		#[source]
		source: BoxError,
	},

	#[error(transparent)]
	Hub(#[from] HubError),

	#[error("Unknown folder category: {0}")]
	UnknownFolderCategory(String),

	#[error("Failed to load checkpoint: {0}")]
	CheckpointLoad(String),

	#[error("Checkpoint loader returned {0} outputs, expected at least 3")]
	IncompleteCheckpoint(usize),

	#[error("Node not found: {0}")]
	NodeNotFound(String),

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
