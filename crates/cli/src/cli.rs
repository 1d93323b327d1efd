use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Drive a sift search coordinator against a simulated backend.
#[derive(Parser, Debug)]
#[command(name = "sift", version)]
#[command(about = "Replay typing sessions against a debounced, race-safe search coordinator")]
pub struct Cli {
	/// Coordinator configuration file (TOML)
	#[arg(short, long, value_name = "PATH", env = "SIFT_CONFIG", global = true)]
	pub config: Option<PathBuf>,

	/// Debounce interval in milliseconds, overriding the config file
	#[arg(long, value_name = "MS", global = true)]
	pub debounce_ms: Option<u64>,

	#[command(flatten)]
	pub backend: BackendArgs,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// Simulated backend behavior.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
	/// Base response latency in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 120, global = true)]
	pub latency_ms: u64,

	/// Maximum extra latency per query in milliseconds, derived from the query text
	#[arg(long, value_name = "MS", default_value_t = 400, global = true)]
	pub jitter_ms: u64,

	/// Corpus file with one entry per line, replacing the built-in corpus
	#[arg(long, value_name = "PATH", global = true)]
	pub corpus: Option<PathBuf>,

	/// Number of corpus entries shown as default content
	#[arg(long, value_name = "N", default_value_t = 3, global = true)]
	pub defaults: usize,

	/// Maximum results returned per query
	#[arg(long, value_name = "N", default_value_t = 10, global = true)]
	pub limit: usize,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Replay a keystroke script and print every state transition
	Replay {
		/// Script file: `<delay_ms> <text>` per line, `-` as text clears, `#` starts a comment
		script: PathBuf,

		/// How long to wait for in-flight searches after the last keystroke
		#[arg(long, value_name = "MS", default_value_t = 5_000)]
		settle_ms: u64,
	},
	/// Run a single query immediately and print the result
	Search {
		/// Query text
		query: String,
	},
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn global_flags_apply_after_subcommand() {
		let cli = Cli::try_parse_from(["sift", "search", "paris", "--latency-ms", "5", "--debounce-ms", "50"]).unwrap();
		assert_eq!(cli.backend.latency_ms, 5);
		assert_eq!(cli.debounce_ms, Some(50));
		assert!(matches!(cli.command, Command::Search { ref query } if query == "paris"));
	}
}
