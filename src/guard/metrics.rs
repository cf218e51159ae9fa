// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token lifecycle events observed by a [`TokenGuard`](super::TokenGuard).
#[derive(Debug, Default)]
pub struct GuardMetrics {
	acquisitions: AtomicU64,
	refreshes: AtomicU64,
	exhausted: AtomicU64,
}
impl GuardMetrics {
	/// Returns the number of successful token exchanges.
	pub fn acquisitions(&self) -> u64 {
		self.acquisitions.load(Ordering::Relaxed)
	}

	/// Returns the number of rejected tokens that were discarded for a refresh.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that failed with no retries left.
	pub fn exhausted(&self) -> u64 {
		self.exhausted.load(Ordering::Relaxed)
	}

	pub(crate) fn record_acquisition(&self) {
		self.acquisitions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_exhausted(&self) {
		self.exhausted.fetch_add(1, Ordering::Relaxed);
	}
}
