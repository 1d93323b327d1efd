use tokio_util::sync::CancellationToken;

/// Identity of one search attempt.
///
/// Equality is by generation only. The embedded [`CancellationToken`] is
/// shared by every clone, so invalidating the ledger's copy is visible to the
/// task running the attempt.
#[derive(Debug, Clone)]
pub struct AttemptToken {
	generation: u64,
	cancel: CancellationToken,
}

impl AttemptToken {
	fn new(generation: u64) -> Self {
		Self {
			generation,
			cancel: CancellationToken::new(),
		}
	}

	/// Returns the generation this token was minted with.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true once the token has been superseded or cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation. Repeated calls are no-ops.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Child cancellation handed to transports that can abort natively.
	pub fn transport_cancellation(&self) -> CancellationToken {
		self.cancel.child_token()
	}
}

impl PartialEq for AttemptToken {
	fn eq(&self, other: &Self) -> bool {
		self.generation == other.generation
	}
}

impl Eq for AttemptToken {}

/// Single-slot registry of the current search attempt.
///
/// At most one token is current. Minting a new one invalidates the previous
/// one, and nothing ever makes an invalidated token current again.
#[derive(Debug, Default)]
pub struct CancellationLedger {
	minted: u64,
	current: Option<AttemptToken>,
}

impl CancellationLedger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Mints a fresh token and cancels the previously current one.
	pub fn begin(&mut self) -> AttemptToken {
		self.cancel_all();
		self.minted = self.minted.wrapping_add(1);
		let token = AttemptToken::new(self.minted);
		self.current = Some(token.clone());
		token
	}

	/// Returns whether `token` is the current attempt.
	pub fn is_current(&self, token: &AttemptToken) -> bool {
		self.current.as_ref().is_some_and(|current| current == token)
	}

	/// Invalidates the current token without minting a new one.
	///
	/// Returns `true` if a token was current.
	pub fn cancel_all(&mut self) -> bool {
		match self.current.take() {
			Some(previous) => {
				previous.cancel();
				true
			}
			None => false,
		}
	}

	/// Returns the current token, if any.
	pub fn current(&self) -> Option<&AttemptToken> {
		self.current.as_ref()
	}

	/// Total number of tokens minted so far.
	pub const fn minted(&self) -> u64 {
		self.minted
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_latest_token_is_current() {
		let mut ledger = CancellationLedger::new();
		let tokens: Vec<_> = (0..5).map(|_| ledger.begin()).collect();

		let (latest, stale) = tokens.split_last().unwrap();
		assert!(ledger.is_current(latest));
		assert!(!latest.is_cancelled());
		for token in stale {
			assert!(!ledger.is_current(token), "generation {} still current", token.generation());
			assert!(token.is_cancelled());
		}
		assert_eq!(ledger.minted(), 5);
	}

	#[test]
	fn generations_strictly_increase() {
		let mut ledger = CancellationLedger::new();
		let a = ledger.begin();
		ledger.cancel_all();
		let b = ledger.begin();
		assert!(b.generation() > a.generation());
		assert_ne!(a, b);
	}

	#[test]
	fn cancel_all_leaves_nothing_current() {
		let mut ledger = CancellationLedger::new();
		let token = ledger.begin();

		assert!(ledger.cancel_all());
		assert!(ledger.current().is_none());
		assert!(!ledger.is_current(&token));
		assert!(token.is_cancelled());
	}

	#[test]
	fn cancellation_is_idempotent() {
		let mut ledger = CancellationLedger::new();
		let stale = ledger.begin();
		let current = ledger.begin();

		stale.cancel();
		stale.cancel();
		assert!(ledger.is_current(&current));
		assert!(!current.is_cancelled());

		assert!(ledger.cancel_all());
		assert!(!ledger.cancel_all());
		current.cancel();
		assert_eq!(ledger.minted(), 2);
	}

	#[test]
	fn transport_cancellation_follows_attempt() {
		let mut ledger = CancellationLedger::new();
		let token = ledger.begin();
		let transport = token.transport_cancellation();

		assert!(!transport.is_cancelled());
		ledger.begin();
		assert!(transport.is_cancelled());
	}
}
