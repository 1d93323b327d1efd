use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sift_worker::JoinCtrl;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Disposal flag shared between a guard and its event loop.
///
/// Publishing runs under the same lock that closes the gate, so once
/// [`PublishGate::close`] has returned no publish is in progress and none will
/// start.
#[derive(Debug, Default)]
pub(crate) struct PublishGate {
	closed: Mutex<bool>,
	observed_closed: AtomicBool,
}

impl PublishGate {
	/// Runs `publish` unless the gate is closed. Returns whether it ran.
	pub(crate) fn publish(&self, publish: impl FnOnce()) -> bool {
		let closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
		if *closed {
			return false;
		}
		publish();
		true
	}

	/// Closes the gate, waiting out any publish in progress. Returns `true`
	/// for the call that closed it.
	pub(crate) fn close(&self) -> bool {
		let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
		if *closed {
			return false;
		}
		*closed = true;
		self.observed_closed.store(true, Ordering::Release);
		true
	}

	pub(crate) fn is_closed(&self) -> bool {
		self.observed_closed.load(Ordering::Acquire)
	}
}

/// Ties a coordinator event loop to its owner's lifetime.
///
/// Disposal closes the loop's [`PublishGate`] and cancels its shutdown token.
/// The loop reacts by dropping its debounce deadline, invalidating the
/// current attempt, and aborting in-flight calls before it exits, so a call
/// that settles afterwards has nothing left to reach. Dropping the guard
/// disposes it.
#[derive(Debug)]
pub struct LifecycleGuard {
	shutdown: CancellationToken,
	gate: Arc<PublishGate>,
	join: JoinCtrl,
}

impl LifecycleGuard {
	pub(crate) fn new(shutdown: CancellationToken, gate: Arc<PublishGate>, event_loop: JoinHandle<()>) -> Self {
		Self {
			shutdown,
			gate,
			join: JoinCtrl::new(event_loop),
		}
	}

	/// Requests teardown without waiting for the loop to exit.
	///
	/// Returns `true` for the call that actually disposed; later calls are
	/// no-ops. When this returns the published state is final, even if the
	/// loop is still running on another thread.
	pub fn dispose(&self) -> bool {
		if !self.gate.close() {
			return false;
		}
		tracing::debug!("search.guard.dispose");
		self.shutdown.cancel();
		true
	}

	pub fn is_disposed(&self) -> bool {
		self.gate.is_closed()
	}

	/// Disposes and waits until the event loop has finished tearing down.
	pub async fn shutdown(&self) {
		self.dispose();
		self.join.join().await;
	}

	/// Like [`Self::shutdown`] with an upper bound. Returns `true` if teardown
	/// completed in time.
	pub async fn shutdown_timeout(&self, timeout: Duration) -> bool {
		self.dispose();
		let completed = self.join.join_timeout(timeout).await;
		if !completed {
			tracing::warn!(?timeout, "search event loop did not stop in time");
		}
		completed
	}
}

impl Drop for LifecycleGuard {
	fn drop(&mut self) {
		self.dispose();
	}
}
