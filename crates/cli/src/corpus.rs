//! In-memory search backend with simulated network latency.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sift_search::{CancellationToken, SearchError, SearchSource};

use crate::cli::BackendArgs;

const BUILTIN: &[&str] = &[
	"Paris city council",
	"Paris climbing club",
	"Lyon mayor's office",
	"Lyon food bank volunteers",
	"Marseille harbour authority",
	"Marseille chess society",
	"Toulouse aerospace meetup",
	"Bordeaux wine cooperative",
	"Lille regional prefecture",
	"Nantes cycling association",
	"Nice beach cleanup crew",
	"Strasbourg european quarter office",
	"Grenoble mountain rescue",
	"Rennes open data collective",
	"Montpellier student union",
];

/// Case-insensitive substring search over a fixed list of entries.
///
/// Latency is `latency + hash(query) % (jitter + 1)` milliseconds, so the same
/// query always takes the same time. Queries containing `!` are rejected.
#[derive(Debug, Clone)]
pub struct CorpusSource {
	entries: Vec<String>,
	latency: Duration,
	jitter_ms: u64,
	limit: usize,
}

impl CorpusSource {
	pub fn builtin(args: &BackendArgs) -> Self {
		Self::with_entries(BUILTIN.iter().map(|s| s.to_string()).collect(), args)
	}

	/// Loads one entry per non-blank line of `path`.
	pub fn load(path: &Path, args: &BackendArgs) -> std::io::Result<Self> {
		let text = std::fs::read_to_string(path)?;
		let entries = text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
		Ok(Self::with_entries(entries, args))
	}

	pub fn with_entries(entries: Vec<String>, args: &BackendArgs) -> Self {
		Self {
			entries,
			latency: Duration::from_millis(args.latency_ms),
			jitter_ms: args.jitter_ms,
			limit: args.limit,
		}
	}

	/// First `n` entries, shown while the input is empty.
	pub fn defaults(&self, n: usize) -> Vec<String> {
		self.entries.iter().take(n).cloned().collect()
	}

	pub fn latency_for(&self, query: &str) -> Duration {
		self.latency + Duration::from_millis(stable_hash64(query) % (self.jitter_ms.saturating_add(1)))
	}

	fn matches(&self, query: &str) -> Vec<String> {
		let needle = query.to_lowercase();
		self.entries
			.iter()
			.filter(|entry| entry.to_lowercase().contains(&needle))
			.take(self.limit)
			.cloned()
			.collect()
	}
}

#[async_trait]
impl SearchSource for CorpusSource {
	type Item = String;

	async fn search(&self, query: &str, cancel: CancellationToken) -> Result<Vec<String>, SearchError> {
		let latency = self.latency_for(query);
		tracing::debug!(query, latency_ms = latency.as_millis() as u64, "corpus.request");
		tokio::select! {
			_ = cancel.cancelled() => {
				tracing::debug!(query, "corpus.aborted");
				return Err(SearchError::Other("request aborted".to_string()));
			}
			_ = tokio::time::sleep(latency) => {}
		}

		if query.contains('!') {
			return Err(SearchError::Rejected {
				status: 400,
				message: format!("invalid character in {query:?}"),
			});
		}
		Ok(self.matches(query))
	}
}

/// FNV-1a, stable across processes and platforms.
fn stable_hash64(value: &str) -> u64 {
	const FNV_OFFSET: u64 = 0xcbf29ce484222325;
	const FNV_PRIME: u64 = 0x00000100000001b3;

	let mut hash = FNV_OFFSET;
	for byte in value.as_bytes() {
		hash ^= u64::from(*byte);
		hash = hash.wrapping_mul(FNV_PRIME);
	}
	hash
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn args(latency_ms: u64, jitter_ms: u64, limit: usize) -> BackendArgs {
		BackendArgs {
			latency_ms,
			jitter_ms,
			corpus: None,
			defaults: 3,
			limit,
		}
	}

	#[test]
	fn latency_is_deterministic_and_bounded() {
		let source = CorpusSource::builtin(&args(100, 50, 10));
		for query in ["p", "pa", "paris", "lyon food"] {
			let latency = source.latency_for(query);
			assert_eq!(latency, source.latency_for(query));
			assert!(latency >= Duration::from_millis(100) && latency <= Duration::from_millis(150), "{query}: {latency:?}");
		}
		assert_eq!(CorpusSource::builtin(&args(7, 0, 10)).latency_for("anything"), Duration::from_millis(7));
	}

	#[test]
	fn defaults_take_leading_entries() {
		let source = CorpusSource::builtin(&args(0, 0, 10));
		assert_eq!(source.defaults(2), vec!["Paris city council".to_string(), "Paris climbing club".to_string()]);
	}

	#[tokio::test(start_paused = true)]
	async fn matches_case_insensitively_up_to_limit() {
		let source = CorpusSource::builtin(&args(10, 0, 1));
		let hits = source.search("PARIS", CancellationToken::new()).await.unwrap();
		assert_eq!(hits, vec!["Paris city council".to_string()]);
	}

	#[tokio::test(start_paused = true)]
	async fn bang_queries_are_rejected() {
		let source = CorpusSource::builtin(&args(10, 0, 10));
		let err = source.search("lyon!", CancellationToken::new()).await.unwrap_err();
		assert!(matches!(err, SearchError::Rejected { status: 400, .. }));
	}

	#[tokio::test(start_paused = true)]
	async fn observes_cancellation() {
		let source = CorpusSource::builtin(&args(10_000, 0, 10));
		let cancel = CancellationToken::new();
		cancel.cancel();
		let err = source.search("paris", cancel).await.unwrap_err();
		assert_eq!(err, SearchError::Other("request aborted".to_string()));
	}

	#[test]
	fn loads_entries_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		std::fs::write(&path, "alpha\n\n  beta  \n").unwrap();
		let source = CorpusSource::load(&path, &args(0, 0, 10)).unwrap();
		assert_eq!(source.defaults(5), vec!["alpha".to_string(), "beta".to_string()]);
	}
}
