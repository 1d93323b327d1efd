use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum JoinState {
	/// Task handle still owned; the first joiner takes it.
	Owned(JoinHandle<()>),
	/// Some caller is awaiting the handle.
	Joining,
	/// Task has completed.
	Done,
}

/// Shared join point for a long-lived task.
///
/// Any number of callers may join concurrently: one becomes the leader that
/// awaits the [`JoinHandle`], the rest wait for the leader to finish. A
/// leader that times out puts the handle back for the next caller.
pub struct JoinCtrl {
	state: Mutex<JoinState>,
	done: Notify,
}

impl std::fmt::Debug for JoinCtrl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JoinCtrl").finish_non_exhaustive()
	}
}

impl JoinCtrl {
	pub fn new(handle: JoinHandle<()>) -> Self {
		Self {
			state: Mutex::new(JoinState::Owned(handle)),
			done: Notify::new(),
		}
	}

	/// Waits until the task has completed.
	pub async fn join(&self) {
		self.join_until(None).await;
	}

	/// Waits at most `timeout`. Returns `true` if the task completed.
	pub async fn join_timeout(&self, timeout: Duration) -> bool {
		self.join_until(Some(Instant::now() + timeout)).await
	}

	async fn join_until(&self, deadline: Option<Instant>) -> bool {
		loop {
			let mut handle = {
				let mut state = self.state.lock().await;
				match &*state {
					JoinState::Done => return true,
					JoinState::Joining => {
						// Register before unlocking so the leader's notify cannot be missed.
						let notified = self.done.notified();
						drop(state);
						match deadline {
							Some(deadline) => {
								tokio::select! {
									_ = notified => continue,
									_ = tokio::time::sleep_until(deadline) => return false,
								}
							}
							None => {
								notified.await;
								continue;
							}
						}
					}
					JoinState::Owned(_) => {
						let JoinState::Owned(handle) = std::mem::replace(&mut *state, JoinState::Joining) else {
							unreachable!()
						};
						handle
					}
				}
			};

			let finished = match deadline {
				Some(deadline) => {
					tokio::select! {
						_ = &mut handle => true,
						_ = tokio::time::sleep_until(deadline) => false,
					}
				}
				None => {
					let _ = (&mut handle).await;
					true
				}
			};

			*self.state.lock().await = if finished { JoinState::Done } else { JoinState::Owned(handle) };
			self.done.notify_waiters();
			return finished;
		}
	}

	/// Returns `true` once some caller has observed completion.
	pub async fn is_done(&self) -> bool {
		matches!(&*self.state.lock().await, JoinState::Done)
	}
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[tokio::test(start_paused = true)]
	async fn concurrent_joiners_all_observe_completion() {
		let ctrl = Arc::new(JoinCtrl::new(tokio::spawn(async {
			tokio::time::sleep(Duration::from_millis(50)).await;
		})));

		let a = tokio::spawn({
			let ctrl = Arc::clone(&ctrl);
			async move { ctrl.join().await }
		});
		let b = tokio::spawn({
			let ctrl = Arc::clone(&ctrl);
			async move { ctrl.join_timeout(Duration::from_secs(1)).await }
		});

		a.await.unwrap();
		assert!(b.await.unwrap());
		assert!(ctrl.is_done().await);
	}

	#[tokio::test(start_paused = true)]
	async fn timed_out_join_returns_handle_for_later_callers() {
		let ctrl = JoinCtrl::new(tokio::spawn(async {
			tokio::time::sleep(Duration::from_secs(10)).await;
		}));

		assert!(!ctrl.join_timeout(Duration::from_millis(10)).await);
		assert!(!ctrl.is_done().await);
		assert!(ctrl.join_timeout(Duration::from_secs(20)).await);
		assert!(ctrl.is_done().await);
	}
}
