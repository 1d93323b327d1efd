//! Debounced, cancellable, race-safe search coordination.
//!
//! A [`SearchCoordinator`] turns a stream of raw text-input events into a
//! [`SearchState`] that always reflects the most recently *issued* search,
//! regardless of the order in which responses arrive.
//!
//! The pieces are usable on their own: [`Debouncer`] coalesces input,
//! [`CancellationLedger`] tracks which [`AttemptToken`] is current,
//! [`QueryExecutor`] runs calls against a [`SearchSource`], and
//! [`SearchMachine`] applies their outcomes.

mod config;
mod coordinator;
mod debounce;
mod error;
mod executor;
mod guard;
mod ledger;
mod source;
mod state;

pub use config::{CoordinatorConfig, DEFAULT_DEBOUNCE, DEFAULT_TRANSITION_BUFFER};
pub use coordinator::SearchCoordinator;
pub use debounce::Debouncer;
pub use error::{ConfigError, ConfigResult, CoordinatorError, SearchError};
pub use executor::{QueryExecutor, Settlement};
pub use guard::LifecycleGuard;
pub use ledger::{AttemptToken, CancellationLedger};
pub use source::{FnSource, SearchSource, source_fn};
pub use state::{Outcome, SearchMachine, SearchState, Step};
pub use tokio_util::sync::CancellationToken;
