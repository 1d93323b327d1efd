use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;

/// Asynchronous search backend injected by the consumer.
///
/// `cancel` fires when the attempt is superseded, cleared, or torn down.
/// Observing it is optional: the coordinator drops the call's future and
/// ignores its result either way.
#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
	/// Domain result type, opaque to the coordinator.
	type Item: Send + Sync + 'static;

	async fn search(&self, query: &str, cancel: CancellationToken) -> Result<Vec<Self::Item>, SearchError>;
}

/// [`SearchSource`] adapter over an async closure.
pub struct FnSource<F, T> {
	search: F,
	_item: PhantomData<fn() -> T>,
}

/// Wraps `f(query, cancel)` as a [`SearchSource`].
pub fn source_fn<F, Fut, T>(f: F) -> FnSource<F, T>
where
	F: Fn(String, CancellationToken) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Vec<T>, SearchError>> + Send + 'static,
	T: Send + Sync + 'static,
{
	FnSource {
		search: f,
		_item: PhantomData,
	}
}

#[async_trait]
impl<F, Fut, T> SearchSource for FnSource<F, T>
where
	F: Fn(String, CancellationToken) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Vec<T>, SearchError>> + Send + 'static,
	T: Send + Sync + 'static,
{
	type Item = T;

	async fn search(&self, query: &str, cancel: CancellationToken) -> Result<Vec<T>, SearchError> {
		(self.search)(query.to_string(), cancel).await
	}
}
