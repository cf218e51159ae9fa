//! Retry policies for transient transport failures.
//!
//! A [`RetryPolicy`] owns the backoff decision for throttling, gateway unavailability, and (if
//! enabled) connection failures. Token rejections are none of its business: it hands
//! [`Error::InvalidAccessToken`] straight back so the guard can refresh the token.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	http::{FetchFuture, Fetcher},
	obs,
	request::{Request, Response},
};

/// Strategy that executes a request through a fetcher and retries transient failures.
pub trait RetryPolicy: Send + Sync {
	/// Executes `request`, retrying as the policy sees fit.
	///
	/// Must propagate invalid-access-token errors unchanged and return the last transient error
	/// once its own budget is spent.
	fn get_response<'a>(
		&'a self,
		fetcher: &'a dyn Fetcher,
		request: &'a Request,
	) -> FetchFuture<'a, Response>;
}

/// Policy that dispatches once and never retries.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleAttempt;
impl RetryPolicy for SingleAttempt {
	fn get_response<'a>(
		&'a self,
		fetcher: &'a dyn Fetcher,
		request: &'a Request,
	) -> FetchFuture<'a, Response> {
		fetcher.execute(request)
	}
}

/// Bounded exponential backoff with jitter.
///
/// Retries HTTP 429 and 503 (and connection failures when enabled) up to `max_attempts` total
/// dispatches. A `Retry-After` hint from upstream raises the delay but never past `max_delay`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
	/// Total dispatches, including the first.
	pub max_attempts: u32,
	/// Delay before the first retry.
	pub base_delay: Duration,
	/// Upper bound for any single delay.
	pub max_delay: Duration,
	/// Randomizes the upper half of each delay.
	pub jitter: bool,
	/// Also retries connection failures (timeouts, resets, DNS).
	pub retry_connection_failures: bool,
}
impl BackoffPolicy {
	/// Creates a policy with `max_attempts` dispatches and default delays.
	pub fn new(max_attempts: u32) -> Self {
		Self { max_attempts: max_attempts.max(1), ..Self::default() }
	}

	/// Overrides the base and maximum delays.
	pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
		self.base_delay = base_delay;
		self.max_delay = max_delay.max(base_delay);

		self
	}

	/// Enables or disables jitter.
	pub fn with_jitter(mut self, jitter: bool) -> Self {
		self.jitter = jitter;

		self
	}

	/// Enables or disables retrying connection failures.
	pub fn with_connection_retries(mut self, enabled: bool) -> Self {
		self.retry_connection_failures = enabled;

		self
	}

	/// Whether the policy would replay a request after `err`.
	pub fn should_retry(&self, err: &Error) -> bool {
		match err {
			Error::Throttled { .. } | Error::GatewayUnavailable { .. } => true,
			Error::Connection(_) => self.retry_connection_failures,
			_ => false,
		}
	}

	/// Delay before retry number `retry` (1-based) after `err`.
	pub fn delay_for(&self, retry: u32, err: &Error) -> Duration {
		let exponent = retry.saturating_sub(1).min(16);
		let backoff = self.base_delay.saturating_mul(1_u32 << exponent).min(self.max_delay);
		let backoff = if self.jitter { jittered(backoff) } else { backoff };

		match err.retry_after() {
			Some(hint) => hint.max(backoff).min(self.max_delay),
			None => backoff,
		}
	}

	async fn run(&self, fetcher: &dyn Fetcher, request: &Request) -> Result<Response> {
		let mut attempt = 1;

		loop {
			match fetcher.execute(request).await {
				Ok(response) => return Ok(response),
				Err(err) if attempt < self.max_attempts && self.should_retry(&err) => {
					let delay = self.delay_for(attempt, &err);

					obs::trace_transient_retry(attempt, self.max_attempts, delay, &err);

					tokio::time::sleep(delay).await;

					attempt += 1;
				},
				Err(err) => return Err(err),
			}
		}
	}
}
impl Default for BackoffPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(250),
			max_delay: Duration::from_secs(10),
			jitter: true,
			retry_connection_failures: false,
		}
	}
}
impl RetryPolicy for BackoffPolicy {
	fn get_response<'a>(
		&'a self,
		fetcher: &'a dyn Fetcher,
		request: &'a Request,
	) -> FetchFuture<'a, Response> {
		Box::pin(self.run(fetcher, request))
	}
}

// Keeps the lower half of the delay and randomizes the rest.
fn jittered(delay: Duration) -> Duration {
	let half = delay / 2;
	let spread = u64::try_from(half.as_millis()).unwrap_or(u64::MAX);

	if spread == 0 {
		return delay;
	}

	half + Duration::from_millis(rand::rng().random_range(0..=spread))
}
