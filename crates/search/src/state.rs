//! Search state machine.
//!
//! [`SearchMachine`] is the only writer of [`SearchState`]. It owns the
//! [`CancellationLedger`] and consults it before applying any settlement, so
//! a response for a superseded attempt can never be observed.
//!
//! # Invariants
//!
//! * A token is current in the ledger exactly while the state is `Pending`.
//! * Settlements for non-current tokens are dropped without side effects.
//! * Entering `Default` cancels the current token first.
//! * After [`SearchMachine::dispose`] every operation is a no-op.

use std::sync::Arc;

use crate::ledger::{AttemptToken, CancellationLedger};

/// What the consumer should render.
#[derive(Debug, PartialEq)]
pub enum SearchState<T, D> {
	/// No query; show consumer-supplied default content.
	Default(D),
	/// A request for `query` is in flight.
	Pending { query: String },
	/// The latest attempt for `query` succeeded.
	Ready { query: String, results: Arc<[T]> },
	/// The latest attempt for `query` failed.
	Failed { query: String, message: String },
}

impl<T, D: Clone> Clone for SearchState<T, D> {
	fn clone(&self) -> Self {
		match self {
			Self::Default(default) => Self::Default(default.clone()),
			Self::Pending { query } => Self::Pending { query: query.clone() },
			Self::Ready { query, results } => Self::Ready {
				query: query.clone(),
				results: Arc::clone(results),
			},
			Self::Failed { query, message } => Self::Failed {
				query: query.clone(),
				message: message.clone(),
			},
		}
	}
}

impl<T, D> SearchState<T, D> {
	/// Query this state belongs to; `None` for `Default`.
	pub fn query(&self) -> Option<&str> {
		match self {
			Self::Default(_) => None,
			Self::Pending { query } | Self::Ready { query, .. } | Self::Failed { query, .. } => Some(query),
		}
	}

	pub fn is_default(&self) -> bool {
		matches!(self, Self::Default(_))
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Pending { .. })
	}

	pub fn results(&self) -> Option<&[T]> {
		match self {
			Self::Ready { results, .. } => Some(results),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Failed { message, .. } => Some(message),
			_ => None,
		}
	}

	pub fn default_content(&self) -> Option<&D> {
		match self {
			Self::Default(default) => Some(default),
			_ => None,
		}
	}

	/// Short variant name for logs.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Default(_) => "default",
			Self::Pending { .. } => "pending",
			Self::Ready { .. } => "ready",
			Self::Failed { .. } => "failed",
		}
	}
}

/// How a search call settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
	Success(Vec<T>),
	Failure(String),
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Step {
	/// Nothing observable happened.
	Unchanged,
	/// The state changed; publish it.
	Changed,
	/// The state changed to `Pending`; publish it and run the attempt.
	Launch { query: String, token: AttemptToken },
}

impl Step {
	pub fn changed(&self) -> bool {
		!matches!(self, Self::Unchanged)
	}
}

/// Authoritative search state plus the ledger that guards it.
#[derive(Debug)]
pub struct SearchMachine<T, D> {
	state: SearchState<T, D>,
	default: D,
	ledger: CancellationLedger,
	disposed: bool,
}

impl<T, D: Clone> SearchMachine<T, D> {
	/// Creates a machine in `Default(default)`.
	pub fn new(default: D) -> Self {
		Self {
			state: SearchState::Default(default.clone()),
			default,
			ledger: CancellationLedger::new(),
			disposed: false,
		}
	}

	pub fn state(&self) -> &SearchState<T, D> {
		&self.state
	}

	pub fn ledger(&self) -> &CancellationLedger {
		&self.ledger
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// Applies a committed query.
	///
	/// Empty clears to `Default`. Non-empty mints a token and enters
	/// `Pending`, except while already pending on the same query, where the
	/// in-flight attempt is kept.
	pub fn query_changed(&mut self, query: String) -> Step {
		if self.disposed {
			return Step::Unchanged;
		}

		if query.is_empty() {
			let cancelled = self.ledger.cancel_all();
			if self.state.is_default() {
				return Step::Unchanged;
			}
			tracing::trace!(cancelled, "search.clear");
			self.state = SearchState::Default(self.default.clone());
			return Step::Changed;
		}

		if let SearchState::Pending { query: pending } = &self.state
			&& *pending == query
			&& self.ledger.current().is_some()
		{
			return Step::Unchanged;
		}

		self.launch(query)
	}

	/// Re-issues the query of a settled `Ready` or `Failed` state.
	pub fn resubmit(&mut self) -> Step {
		if self.disposed {
			return Step::Unchanged;
		}
		match &self.state {
			SearchState::Ready { query, .. } | SearchState::Failed { query, .. } => {
				let query = query.clone();
				self.launch(query)
			}
			SearchState::Default(_) | SearchState::Pending { .. } => Step::Unchanged,
		}
	}

	fn launch(&mut self, query: String) -> Step {
		let token = self.ledger.begin();
		self.state = SearchState::Pending { query: query.clone() };
		Step::Launch { query, token }
	}

	/// Applies an executor settlement if `token` is still current.
	pub fn settle(&mut self, token: &AttemptToken, outcome: Outcome<T>) -> Step {
		if self.disposed {
			return Step::Unchanged;
		}
		if !self.ledger.is_current(token) {
			tracing::trace!(generation = token.generation(), "search.stale");
			return Step::Unchanged;
		}
		let SearchState::Pending { query } = &self.state else {
			return Step::Unchanged;
		};

		let query = query.clone();
		self.ledger.cancel_all();
		self.state = match outcome {
			Outcome::Success(results) => SearchState::Ready {
				query,
				results: Arc::from(results),
			},
			Outcome::Failure(message) => SearchState::Failed { query, message },
		};
		Step::Changed
	}

	/// Replaces the default content; re-emits `Default` if currently shown.
	pub fn set_default(&mut self, default: D) -> Step {
		if self.disposed {
			return Step::Unchanged;
		}
		self.default = default;
		if self.state.is_default() {
			self.state = SearchState::Default(self.default.clone());
			return Step::Changed;
		}
		Step::Unchanged
	}

	/// Enters the terminal state. Returns `true` on the first call only.
	pub fn dispose(&mut self) -> bool {
		if self.disposed {
			return false;
		}
		self.disposed = true;
		self.ledger.cancel_all();
		true
	}
}
