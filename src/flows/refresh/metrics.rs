// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for refresh network calls and callers that joined one already in flight.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	attached: AtomicU64,
}
impl RefreshMetrics {
	/// Number of refresh-token exchanges sent to the token endpoint.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Number of exchanges whose new pair was persisted.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Number of exchanges that failed (rejection, transport, or store failure).
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Number of callers that awaited another caller's refresh instead of starting one.
	pub fn attached(&self) -> u64 {
		self.attached.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_attached(&self) {
		self.attached.fetch_add(1, Ordering::Relaxed);
	}
}
