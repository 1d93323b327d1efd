//! Search coordinator event loop and consumer handle.
//!
//! # Purpose
//!
//! * Turns a stream of raw text-input events into at most one authoritative
//!   result set per committed query.
//! * Suppresses obsolete requests so the visible state always belongs to the
//!   last issued attempt, not the last completed one.
//! * Exposes the state for rendering and guarantees silence after teardown.
//!
//! # Mental model
//!
//! * One event loop task owns [`Debouncer`], [`SearchMachine`] (and with it
//!   the ledger), and [`QueryExecutor`]. Nothing else mutates them.
//! * [`SearchCoordinator`] is a command handle: input goes in over a channel,
//!   state comes out over `watch` (latest snapshot) and `broadcast` (every
//!   transition).
//! * Search calls are the only thing that suspends. Commit, mint, and launch
//!   happen in one synchronous step of the loop.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`SearchCoordinator`] | Consumer handle | Must refuse commands once disposed | [`SearchCoordinator::spawn`] |
//! | `EventLoop` | Single writer of all coordinator state | Must process commands in arrival order | `EventLoop::run` |
//! | [`SearchState`] | What to render | Must only change through [`SearchMachine`] | `EventLoop::apply` |
//! | [`LifecycleGuard`] | Disposal handle | Must stop the loop before shutdown completes | [`SearchCoordinator::spawn`] |
//!
//! # Invariants
//!
//! * Must consult the ledger before applying any settlement.
//! * Must apply an empty input immediately, bypassing the debounce period.
//! * Must not pass through `Default` when one query supersedes another.
//! * Must cancel the debounce deadline, the current token, and all in-flight
//!   calls before the loop exits.
//! * Must publish only through the `PublishGate`; nothing is published once
//!   [`LifecycleGuard::dispose`] has returned, even mid-iteration on another
//!   worker thread.
//!
//! # Concurrency & ordering
//!
//! * The loop is biased: shutdown, then commands, then the debounce deadline,
//!   then settlements.
//! * Settlements may arrive in any order; token identity decides application.
//!
//! # Failure modes & recovery
//!
//! * Source error: `Failed { query, message }` until the next query change.
//! * Source panic: reported as `Failed` with the panic message.
//! * Stale settlement: dropped with a trace event.
//! * Commands after disposal: [`CoordinatorError::Disposed`].

use std::sync::Arc;

use sift_worker::TaskClass;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::debounce::Debouncer;
use crate::error::CoordinatorError;
use crate::executor::{QueryExecutor, Settlement};
use crate::guard::{LifecycleGuard, PublishGate};
use crate::source::SearchSource;
use crate::state::{SearchMachine, SearchState, Step};

#[derive(Debug)]
enum Command<D> {
	Input(String),
	Flush,
	Resubmit,
	SetDefault(D),
}

struct EventLoop<S: SearchSource, D> {
	debouncer: Debouncer,
	machine: SearchMachine<S::Item, D>,
	executor: QueryExecutor<S>,
	state_tx: watch::Sender<SearchState<S::Item, D>>,
	transitions: broadcast::Sender<SearchState<S::Item, D>>,
	gate: Arc<PublishGate>,
}

impl<S, D> EventLoop<S, D>
where
	S: SearchSource,
	D: Clone + Send + Sync + 'static,
{
	async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<D>>, shutdown: CancellationToken) {
		loop {
			let deadline = self.debouncer.deadline();
			tokio::select! {
				biased;
				_ = shutdown.cancelled() => break,
				cmd = commands.recv() => match cmd {
					Some(cmd) => self.handle(cmd),
					None => break,
				},
				_ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
					if let Some(query) = self.debouncer.poll(Instant::now()) {
						self.commit(query);
					}
				}
				Some(settlement) = self.executor.next_settlement(), if self.executor.in_flight() > 0 => {
					self.settle(settlement);
				}
			}
		}
		self.teardown();
	}

	fn handle(&mut self, cmd: Command<D>) {
		match cmd {
			Command::Input(raw) => {
				if let Some(query) = self.debouncer.commit(raw, Instant::now()) {
					self.commit(query);
				}
			}
			Command::Flush => {
				if let Some(query) = self.debouncer.flush() {
					self.commit(query);
				}
			}
			Command::Resubmit => {
				let step = self.machine.resubmit();
				self.apply(step);
			}
			Command::SetDefault(default) => {
				let step = self.machine.set_default(default);
				self.apply(step);
			}
		}
	}

	fn commit(&mut self, query: String) {
		tracing::trace!(query = %query, "search.commit");
		let step = self.machine.query_changed(query);
		self.apply(step);
	}

	fn settle(&mut self, settlement: Settlement<S::Item>) {
		let Settlement { token, query, outcome } = settlement;
		let step = self.machine.settle(&token, outcome);
		if !step.changed() {
			tracing::trace!(generation = token.generation(), query = %query, "search.settle.ignored");
		}
		self.apply(step);
	}

	fn apply(&mut self, step: Step) {
		match step {
			Step::Unchanged => {}
			Step::Changed => self.publish(),
			Step::Launch { query, token } => {
				self.publish();
				self.executor.execute(query, token);
			}
		}
	}

	fn publish(&self) {
		let state = self.machine.state().clone();
		let notification = state.clone();
		let (label, query) = (state.label(), state.query().unwrap_or_default().to_string());
		let published = self.gate.publish(|| {
			let _ = self.transitions.send(notification);
			self.state_tx.send_replace(state);
		});
		if published {
			tracing::debug!(state = label, query = %query, "search.transition");
		} else {
			tracing::trace!(state = label, query = %query, "search.transition.suppressed");
		}
	}

	fn teardown(&mut self) {
		let dropped_commit = self.debouncer.cancel_pending();
		self.machine.dispose();
		let in_flight = self.executor.in_flight();
		self.executor.abort_all();
		tracing::debug!(dropped_commit, in_flight, "search.dispose");
	}
}

/// Handle to a running search coordinator.
///
/// Dropping the handle disposes the coordinator.
pub struct SearchCoordinator<T, D> {
	commands: mpsc::UnboundedSender<Command<D>>,
	state: watch::Receiver<SearchState<T, D>>,
	transitions: broadcast::WeakSender<SearchState<T, D>>,
	guard: LifecycleGuard,
}

impl<T, D> std::fmt::Debug for SearchCoordinator<T, D> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SearchCoordinator").field("guard", &self.guard).finish_non_exhaustive()
	}
}

impl<T, D> SearchCoordinator<T, D>
where
	T: Send + Sync + 'static,
	D: Clone + Send + Sync + 'static,
{
	/// Starts a coordinator showing `Default(default)` and searching `source`.
	pub fn spawn<S>(config: &CoordinatorConfig, source: S, default: D) -> Self
	where
		S: SearchSource<Item = T>,
	{
		let machine = SearchMachine::new(default);
		let (state_tx, state) = watch::channel(machine.state().clone());
		let (transitions, _) = broadcast::channel(config.transition_buffer.max(1));
		let weak_transitions = transitions.downgrade();
		let (commands, command_rx) = mpsc::unbounded_channel();
		let shutdown = CancellationToken::new();
		let gate = Arc::new(PublishGate::default());

		let event_loop = EventLoop {
			debouncer: Debouncer::new(config.debounce()),
			machine,
			executor: QueryExecutor::new(Arc::new(source)),
			state_tx,
			transitions,
			gate: Arc::clone(&gate),
		};
		tracing::debug!(debounce_ms = config.debounce_ms, "search.spawn");
		let handle = sift_worker::spawn(TaskClass::Interactive, event_loop.run(command_rx, shutdown.clone()));

		Self {
			commands,
			state,
			transitions: weak_transitions,
			guard: LifecycleGuard::new(shutdown, gate, handle),
		}
	}

	fn send(&self, cmd: Command<D>) -> Result<(), CoordinatorError> {
		if self.guard.is_disposed() {
			return Err(CoordinatorError::Disposed);
		}
		self.commands.send(cmd).map_err(|_| CoordinatorError::Disposed)
	}

	/// Feeds the current text of the input field.
	pub fn input(&self, raw: impl Into<String>) -> Result<(), CoordinatorError> {
		self.send(Command::Input(raw.into()))
	}

	/// Clears the query, restoring default content immediately.
	pub fn clear(&self) -> Result<(), CoordinatorError> {
		self.input(String::new())
	}

	/// Commits a debounced query now instead of at the end of its quiet period.
	pub fn flush(&self) -> Result<(), CoordinatorError> {
		self.send(Command::Flush)
	}

	/// Searches the last settled query again.
	pub fn resubmit(&self) -> Result<(), CoordinatorError> {
		self.send(Command::Resubmit)
	}

	/// Replaces the content shown while no query is active.
	pub fn set_default(&self, default: D) -> Result<(), CoordinatorError> {
		self.send(Command::SetDefault(default))
	}

	/// Latest published state.
	pub fn state(&self) -> SearchState<T, D> {
		self.state.borrow().clone()
	}

	/// Receiver that always holds the latest state.
	pub fn watch(&self) -> watch::Receiver<SearchState<T, D>> {
		self.state.clone()
	}

	/// Subscribes to every state transition from now on.
	///
	/// The receiver reports `Closed` once the coordinator has shut down.
	pub fn transitions(&self) -> broadcast::Receiver<SearchState<T, D>> {
		match self.transitions.upgrade() {
			Some(tx) => tx.subscribe(),
			None => broadcast::channel(1).1,
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.guard.is_disposed()
	}

	/// Requests teardown without waiting. Returns `true` on the first call.
	pub fn dispose(&self) -> bool {
		self.guard.dispose()
	}

	/// Disposes and waits until the event loop has stopped.
	pub async fn shutdown(&self) {
		self.guard.shutdown().await;
	}

	pub fn guard(&self) -> &LifecycleGuard {
		&self.guard
	}
}
