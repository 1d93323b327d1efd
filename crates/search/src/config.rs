use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Default quiet period before a typed query is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Default capacity of the transition broadcast channel.
pub const DEFAULT_TRANSITION_BUFFER: usize = 64;

/// Tunables for one [`crate::SearchCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
	/// Quiet period in milliseconds before a non-empty query is committed.
	pub debounce_ms: u64,
	/// Transition notifications buffered per subscriber before lagging.
	pub transition_buffer: usize,
}

impl Default for CoordinatorConfig {
	fn default() -> Self {
		Self {
			debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
			transition_buffer: DEFAULT_TRANSITION_BUFFER,
		}
	}
}

impl CoordinatorConfig {
	/// Returns the debounce interval.
	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	/// Sets the debounce interval, truncated to whole milliseconds.
	#[must_use]
	pub fn with_debounce(mut self, debounce: Duration) -> Self {
		self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
		self
	}

	/// Sets the transition broadcast capacity.
	#[must_use]
	pub fn with_transition_buffer(mut self, capacity: usize) -> Self {
		self.transition_buffer = capacity;
		self
	}

	/// Parses and validates configuration from TOML text.
	///
	/// Missing keys fall back to their defaults.
	pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads configuration from a TOML file.
	pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}

	/// Checks value ranges that serde cannot express.
	pub fn validate(&self) -> ConfigResult<()> {
		if self.transition_buffer == 0 {
			return Err(ConfigError::Invalid("transition_buffer must be > 0".to_string()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(CoordinatorConfig::from_toml_str("").unwrap(), CoordinatorConfig::default());
		assert_eq!(CoordinatorConfig::default().debounce(), Duration::from_millis(600));
	}

	#[test]
	fn partial_document_overrides_only_named_keys() {
		let config = CoordinatorConfig::from_toml_str("debounce_ms = 150\n").unwrap();
		assert_eq!(config.debounce(), Duration::from_millis(150));
		assert_eq!(config.transition_buffer, DEFAULT_TRANSITION_BUFFER);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let err = CoordinatorConfig::from_toml_str("debounce = 10\n").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)), "got {err:?}");
	}

	#[test]
	fn zero_transition_buffer_is_invalid() {
		let err = CoordinatorConfig::from_toml_str("transition_buffer = 0\n").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
	}

	#[test]
	fn load_reads_file_and_reports_missing_path() {
		let dir = tempfile::tempdir().expect("must create tempdir");
		let path = dir.path().join("sift.toml");
		std::fs::write(&path, "debounce_ms = 250\ntransition_buffer = 8\n").expect("must write config");

		let config = CoordinatorConfig::load(&path).unwrap();
		assert_eq!(config, CoordinatorConfig::default().with_debounce(Duration::from_millis(250)).with_transition_buffer(8));

		let missing = dir.path().join("absent.toml");
		let err = CoordinatorConfig::load(&missing).unwrap_err();
		assert!(matches!(err, ConfigError::Io { ref path, .. } if path == &missing), "got {err:?}");
	}
}
