use std::future::Future;

use tokio::task::{Id, JoinError, JoinSet};

use crate::TaskClass;

/// Classified wrapper for a Tokio [`JoinSet`].
///
/// Task spawning is routed through the `sift_worker` runtime handle so tasks
/// are attached to the active runtime context even when the set is driven
/// from outside one.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty join set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set and returns its task ID.
	#[allow(clippy::disallowed_methods)]
	pub fn spawn<F>(&mut self, fut: F) -> Id
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		let handle = crate::spawn::runtime_handle();
		self.inner.spawn_on(fut, &handle).id()
	}

	/// Waits for the next completed task.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Waits for the next completed task, tagging successes with their task ID.
	///
	/// Failed joins carry their ID on the [`JoinError`].
	pub async fn join_next_with_id(&mut self) -> Option<Result<(Id, T), JoinError>> {
		self.inner.join_next_with_id().await
	}

	/// Aborts every task in the set without waiting for them.
	///
	/// Aborted tasks still surface as cancelled [`JoinError`]s from the join
	/// methods until the set is drained or dropped.
	pub fn abort_all(&mut self) {
		if !self.inner.is_empty() {
			tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.abort_all");
		}
		self.inner.abort_all();
	}
}
