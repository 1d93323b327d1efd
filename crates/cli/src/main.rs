//! Sift command line driver.
//!
//! Runs a [`SearchCoordinator`] over an in-memory corpus with simulated
//! latency, either replaying a timed keystroke script or issuing one query.

mod cli;
mod corpus;
mod logging;
mod script;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sift_search::{CoordinatorConfig, SearchCoordinator, SearchState};
use sift_worker::TaskClass;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep, timeout};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::corpus::CorpusSource;

type Coordinator = SearchCoordinator<String, Vec<String>>;
type State = SearchState<String, Vec<String>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	logging::setup_tracing(cli.verbose);

	let config = load_config(&cli)?;
	let source = match &cli.backend.corpus {
		Some(path) => CorpusSource::load(path, &cli.backend).with_context(|| format!("failed to read corpus {}", path.display()))?,
		None => CorpusSource::builtin(&cli.backend),
	};
	let defaults = source.defaults(cli.backend.defaults);
	info!(debounce_ms = config.debounce_ms, latency_ms = cli.backend.latency_ms, "starting sift");

	let coordinator = SearchCoordinator::spawn(&config, source, defaults);
	let result = match cli.command {
		Command::Replay { script: path, settle_ms } => {
			let text = std::fs::read_to_string(&path).with_context(|| format!("failed to read script {}", path.display()))?;
			let keystrokes = script::parse(&text).with_context(|| format!("invalid script {}", path.display()))?;
			replay(&coordinator, &config, keystrokes, Duration::from_millis(settle_ms)).await
		}
		Command::Search { query } => search(&coordinator, query).await,
	};
	coordinator.shutdown().await;
	result
}

fn load_config(cli: &Cli) -> anyhow::Result<CoordinatorConfig> {
	let mut config = match &cli.config {
		Some(path) => CoordinatorConfig::load(path)?,
		None => CoordinatorConfig::default(),
	};
	if let Some(ms) = cli.debounce_ms {
		config = config.with_debounce(Duration::from_millis(ms));
	}
	config.validate()?;
	Ok(config)
}

async fn replay(coordinator: &Coordinator, config: &CoordinatorConfig, keystrokes: Vec<script::Keystroke>, settle: Duration) -> anyhow::Result<()> {
	let start = Instant::now();
	let printer = sift_worker::spawn(TaskClass::Background, print_transitions(coordinator.transitions(), start));

	for keystroke in keystrokes {
		sleep(keystroke.delay).await;
		println!("{:>6}ms  input {:?}", start.elapsed().as_millis(), keystroke.text);
		coordinator.input(keystroke.text)?;
	}

	// Give the last edit its quiet period, then wait for its search.
	sleep(config.debounce() + Duration::from_millis(1)).await;
	let mut watch = coordinator.watch();
	if timeout(settle, watch.wait_for(|state| !state.is_pending())).await.is_err() {
		tracing::warn!(settle_ms = settle.as_millis() as u64, "search still pending after settle period");
	}

	coordinator.shutdown().await;
	match printer.await {
		Ok(printed) => info!(transitions = printed, "replay finished"),
		Err(err) => match sift_worker::join_error_panic_message(err) {
			Some(message) => anyhow::bail!("transition printer panicked: {message}"),
			None => anyhow::bail!("transition printer was cancelled"),
		},
	}
	println!("final   {}", render(&coordinator.state()));
	Ok(())
}

async fn print_transitions(mut rx: broadcast::Receiver<State>, start: Instant) -> usize {
	let mut printed = 0;
	loop {
		match rx.recv().await {
			Ok(state) => {
				printed += 1;
				println!("{:>6}ms  {}", start.elapsed().as_millis(), render(&state));
			}
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "transition printer lagged");
			}
			Err(broadcast::error::RecvError::Closed) => return printed,
		}
	}
}

async fn search(coordinator: &Coordinator, query: String) -> anyhow::Result<()> {
	if query.is_empty() {
		println!("{}", render(&coordinator.state()));
		return Ok(());
	}

	let mut watch = coordinator.watch();
	coordinator.input(query.as_str())?;
	coordinator.flush()?;
	let settled = watch
		.wait_for(|state| state.query() == Some(query.as_str()) && !state.is_pending())
		.await
		.map(|state| state.clone())
		.context("search coordinator stopped before the query settled")?;

	println!("{}", render(&settled));
	if let Some(message) = settled.error() {
		anyhow::bail!("search failed: {message}");
	}
	Ok(())
}

fn render(state: &State) -> String {
	match state {
		SearchState::Default(entries) => format!("default [{}]", entries.join(", ")),
		SearchState::Pending { query } => format!("pending {query:?}"),
		SearchState::Ready { query, results } if results.is_empty() => format!("ready   {query:?} no results"),
		SearchState::Ready { query, results } => format!("ready   {query:?} [{}]", results.join(", ")),
		SearchState::Failed { query, message } => format!("failed  {query:?} {message}"),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn renders_each_state() {
		assert_eq!(render(&SearchState::Default(vec!["a".into(), "b".into()])), "default [a, b]");
		assert_eq!(render(&SearchState::Pending { query: "pa".into() }), "pending \"pa\"");
		assert_eq!(
			render(&SearchState::Ready {
				query: "pa".into(),
				results: Arc::from(Vec::<String>::new()),
			}),
			"ready   \"pa\" no results"
		);
		assert_eq!(
			render(&SearchState::Failed {
				query: "pa!".into(),
				message: "boom".into(),
			}),
			"failed  \"pa!\" boom"
		);
	}

	#[test]
	fn debounce_flag_overrides_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("sift.toml");
		std::fs::write(&path, "debounce_ms = 250\ntransition_buffer = 8\n").unwrap();

		let cli = Cli::try_parse_from(["sift", "--config", path.to_str().unwrap(), "search", "x"]).unwrap();
		let config = load_config(&cli).unwrap();
		assert_eq!(config.debounce_ms, 250);
		assert_eq!(config.transition_buffer, 8);

		let cli = Cli::try_parse_from(["sift", "--config", path.to_str().unwrap(), "--debounce-ms", "40", "search", "x"]).unwrap();
		assert_eq!(load_config(&cli).unwrap().debounce(), Duration::from_millis(40));
	}

	#[tokio::test(start_paused = true)]
	async fn search_reports_ready_results() {
		let args = crate::cli::BackendArgs {
			latency_ms: 50,
			jitter_ms: 0,
			corpus: None,
			defaults: 2,
			limit: 10,
		};
		let source = CorpusSource::builtin(&args);
		let coordinator = SearchCoordinator::spawn(&CoordinatorConfig::default(), source.clone(), source.defaults(2));
		search(&coordinator, "lyon".to_string()).await.unwrap();
		assert_eq!(coordinator.state().results().map(<[String]>::len), Some(2));

		let err = search(&coordinator, "lyon!".to_string()).await.unwrap_err();
		assert!(err.to_string().contains("invalid character"), "{err}");
		coordinator.shutdown().await;
	}
}
