use tokio::task::JoinError;

/// Extracts the panic payload message from a failed join.
///
/// Returns `None` when the task was cancelled rather than panicking, or when
/// the payload is neither a `&str` nor a `String`.
pub fn join_error_panic_message(err: JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	payload.downcast_ref::<String>().cloned()
}

#[cfg(test)]
#[path = "panic_tests.rs"]
mod tests;
