use std::collections::HashMap;
use std::sync::Arc;

use sift_worker::{TaskClass, WorkerJoinSet, join_error_panic_message};
use tokio::task::Id;

use crate::ledger::AttemptToken;
use crate::source::SearchSource;
use crate::state::Outcome;

/// One settled search call, tagged with the attempt that issued it.
#[derive(Debug)]
pub struct Settlement<T> {
	pub token: AttemptToken,
	pub query: String,
	pub outcome: Outcome<T>,
}

#[derive(Debug)]
struct Attempt {
	token: AttemptToken,
	query: String,
}

/// Runs search calls for attempts and reports how they settled.
///
/// Each call races its attempt token: once the token is cancelled the call's
/// future is dropped, which releases whatever the transport holds. Cancelled
/// calls never produce a [`Settlement`].
pub struct QueryExecutor<S: SearchSource> {
	source: Arc<S>,
	tasks: WorkerJoinSet<Option<Outcome<S::Item>>>,
	attempts: HashMap<Id, Attempt>,
}

impl<S: SearchSource> std::fmt::Debug for QueryExecutor<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QueryExecutor").field("attempts", &self.attempts).finish_non_exhaustive()
	}
}

impl<S: SearchSource> QueryExecutor<S> {
	pub fn new(source: Arc<S>) -> Self {
		Self {
			source,
			tasks: WorkerJoinSet::new(TaskClass::Background),
			attempts: HashMap::new(),
		}
	}

	/// Starts the search call for `query` under `token`.
	pub fn execute(&mut self, query: String, token: AttemptToken) {
		let source = Arc::clone(&self.source);
		let task_token = token.clone();
		let task_query = query.clone();
		let id = self.tasks.spawn(async move {
			let transport = task_token.transport_cancellation();
			tokio::select! {
				biased;
				_ = task_token.cancelled() => None,
				res = source.search(&task_query, transport) => Some(match res {
					Ok(items) => Outcome::Success(items),
					Err(err) => Outcome::Failure(err.to_string()),
				}),
			}
		});
		tracing::trace!(generation = token.generation(), query = %query, "search.execute");
		self.attempts.insert(id, Attempt { token, query });
	}

	/// Waits for the next call that settled with results or an error.
	///
	/// Returns `None` once nothing is in flight. Cancel-safe: dropping the
	/// future loses no settlement.
	pub async fn next_settlement(&mut self) -> Option<Settlement<S::Item>> {
		loop {
			match self.tasks.join_next_with_id().await? {
				Ok((id, Some(outcome))) => {
					let Some(Attempt { token, query }) = self.attempts.remove(&id) else {
						continue;
					};
					return Some(Settlement { token, query, outcome });
				}
				Ok((id, None)) => {
					if let Some(attempt) = self.attempts.remove(&id) {
						tracing::trace!(generation = attempt.token.generation(), "search.cancelled");
					}
				}
				Err(err) => {
					let Some(Attempt { token, query }) = self.attempts.remove(&err.id()) else {
						continue;
					};
					if err.is_cancelled() {
						continue;
					}
					let message = join_error_panic_message(err).unwrap_or_else(|| "unknown panic payload".to_string());
					tracing::warn!(generation = token.generation(), query = %query, message = %message, "search source panicked");
					return Some(Settlement {
						token,
						query,
						outcome: Outcome::Failure(format!("search panicked: {message}")),
					});
				}
			}
		}
	}

	/// Aborts every in-flight call.
	pub fn abort_all(&mut self) {
		for attempt in self.attempts.values() {
			attempt.token.cancel();
		}
		self.attempts.clear();
		self.tasks.abort_all();
	}

	/// Number of calls not yet reaped.
	pub fn in_flight(&self) -> usize {
		self.tasks.len()
	}
}
