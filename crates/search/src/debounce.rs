//! Trailing-edge coalescing of raw input into committed queries.
//!
//! The debouncer owns no timer. The event loop reads [`Debouncer::deadline`],
//! sleeps until it, and collects the due query with [`Debouncer::poll`].
//! Dropping the loop therefore drops the timer with it.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct PendingQuery {
	query: String,
	due_at: Instant,
}

/// Buffers rapid input changes and releases at most one query per quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
	wait: Duration,
	pending: Option<PendingQuery>,
}

impl Debouncer {
	pub fn new(wait: Duration) -> Self {
		Self { wait, pending: None }
	}

	pub fn wait(&self) -> Duration {
		self.wait
	}

	/// Records a raw input change.
	///
	/// Non-empty input replaces any pending value and restarts the quiet
	/// period; nothing is emitted yet. Empty input is a clear: any pending
	/// value is dropped and `Some("")` is returned for immediate dispatch.
	pub fn commit(&mut self, raw: impl Into<String>, now: Instant) -> Option<String> {
		let query = raw.into();
		if query.is_empty() {
			self.pending = None;
			return Some(query);
		}
		self.pending = Some(PendingQuery {
			query,
			due_at: now + self.wait,
		});
		None
	}

	/// Takes the pending query if its quiet period has elapsed at `now`.
	pub fn poll(&mut self, now: Instant) -> Option<String> {
		if self.pending.as_ref().is_some_and(|p| now >= p.due_at) {
			return self.pending.take().map(|p| p.query);
		}
		None
	}

	/// Takes the pending query regardless of its deadline.
	pub fn flush(&mut self) -> Option<String> {
		self.pending.take().map(|p| p.query)
	}

	/// Drops any scheduled emission. Returns `true` if one was dropped.
	pub fn cancel_pending(&mut self) -> bool {
		self.pending.take().is_some()
	}

	/// When the pending query becomes due, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.pending.as_ref().map(|p| p.due_at)
	}

	pub fn has_pending(&self) -> bool {
		self.pending.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const WAIT: Duration = Duration::from_millis(600);

	#[test]
	fn rapid_inputs_coalesce_to_last_value() {
		let start = Instant::now();
		let mut debouncer = Debouncer::new(WAIT);

		assert_eq!(debouncer.commit("a", start), None);
		assert_eq!(debouncer.commit("ab", start + Duration::from_millis(20)), None);
		assert_eq!(debouncer.commit("abc", start + Duration::from_millis(45)), None);

		// Quiet period restarts on every input.
		assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(645)));
		assert_eq!(debouncer.poll(start + Duration::from_millis(640)), None);
		assert_eq!(debouncer.poll(start + Duration::from_millis(645)).as_deref(), Some("abc"));
		assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
		assert!(!debouncer.has_pending());
	}

	#[test]
	fn empty_input_bypasses_wait_and_drops_pending() {
		let now = Instant::now();
		let mut debouncer = Debouncer::new(WAIT);

		debouncer.commit("par", now);
		assert_eq!(debouncer.commit("", now).as_deref(), Some(""));
		assert!(!debouncer.has_pending());
		assert_eq!(debouncer.deadline(), None);
	}

	#[test]
	fn cancel_pending_reports_whether_anything_was_dropped() {
		let now = Instant::now();
		let mut debouncer = Debouncer::new(WAIT);

		assert!(!debouncer.cancel_pending());
		debouncer.commit("lyon", now);
		assert!(debouncer.cancel_pending());
		assert!(!debouncer.cancel_pending());
		assert_eq!(debouncer.poll(now + WAIT), None);
	}

	#[test]
	fn flush_releases_pending_before_deadline() {
		let now = Instant::now();
		let mut debouncer = Debouncer::new(WAIT);

		debouncer.commit("nice", now);
		assert_eq!(debouncer.flush().as_deref(), Some("nice"));
		assert_eq!(debouncer.flush(), None);
	}

	#[test]
	fn zero_wait_is_due_immediately() {
		let now = Instant::now();
		let mut debouncer = Debouncer::new(Duration::ZERO);
		assert_eq!(debouncer.wait(), Duration::ZERO);

		assert_eq!(debouncer.commit("x", now), None);
		assert_eq!(debouncer.poll(now).as_deref(), Some("x"));
	}
}
