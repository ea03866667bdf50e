// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::CallOutcome;

/// Thread-safe counters for network refreshes.
///
/// Joining an in-flight refresh or reusing a valid token does not count as an attempt. A
/// refresh that panics counts as a failure.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh calls sent to the auth endpoint.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Refresh calls that produced a token.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Refresh calls that ended in an error or a panic.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: CallOutcome) {
		let counter = match outcome {
			CallOutcome::Attempt => &self.attempts,
			CallOutcome::Success => &self.successes,
			CallOutcome::Failure => &self.failures,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
