//! Error types for search sources, coordinator handles, and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`crate::SearchSource`].
///
/// The `Display` output is what a `Failed` state carries as its message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
	/// The request never produced a response.
	#[error("transport error: {0}")]
	Transport(String),

	/// The backend answered but refused the query.
	#[error("search rejected ({status}): {message}")]
	Rejected {
		/// Backend status code.
		status: u16,
		/// Backend-provided reason.
		message: String,
	},

	/// Anything else a source wants to surface verbatim.
	#[error("{0}")]
	Other(String),
}

/// Error returned by [`crate::SearchCoordinator`] handle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoordinatorError {
	/// The coordinator was disposed; no further input is accepted.
	#[error("search coordinator has been disposed")]
	Disposed,
}

/// Errors that can occur when loading coordinator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {}: {error}", path.display())]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A value parsed but is out of range.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
