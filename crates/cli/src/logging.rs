use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable naming a directory for per-process log files.
pub const LOG_DIR_ENV: &str = "SIFT_LOG_DIR";

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV: &str = "SIFT_LOG";

fn filter(verbose: bool) -> EnvFilter {
	EnvFilter::try_from_env(LOG_FILTER_ENV)
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("sift_search=trace,sift_worker=trace,sift_cli=debug,info")
			} else {
				EnvFilter::new("sift_cli=info,warn")
			}
		})
}

/// Installs the global subscriber.
///
/// Logs go to stderr so that transition output on stdout stays clean, or to
/// `$SIFT_LOG_DIR/sift.<pid>.log` when that directory can be created.
pub fn setup_tracing(verbose: bool) {
	if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("sift.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false).with_target(true);
			tracing_subscriber::registry().with(filter(verbose)).with(file_layer).init();
			tracing::info!(path = ?log_path, "sift tracing initialized");
			return;
		}
	}

	let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false);
	tracing_subscriber::registry().with(filter(verbose)).with(stderr_layer).init();
}
