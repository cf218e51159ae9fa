//! Token-guarded request execution.
//!
//! [`TokenGuard`] attaches a cached access token to every bearer request, hands the attempt to
//! the configured [`RetryPolicy`], and, when the remote service rejects the token, discards it
//! and starts over with a fresh one. The refresh counter lives in the call, so concurrent
//! requests never share or reset each other's budget.

mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	acquirer::{ClientCredentialsAcquirer, TokenAcquirer},
	auth::AccessToken,
	cache::TokenCache,
	error::ConfigError,
	http::Fetcher,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{AuthType, Request, RequestConfig, Response},
	retry::{RetryPolicy, SingleAttempt},
	settings::GuardSettings,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestFetcher, settings::FetcherSettings};

/// Executes requests with a managed access token and a bounded refresh loop.
///
/// One guard is meant to be shared (behind an [`Arc`] or by cloning) across every task that
/// talks to the same service; clones share the cache, the metrics, and the single-flight lock.
#[derive(Clone)]
pub struct TokenGuard {
	fetcher: Arc<dyn Fetcher>,
	retry_policy: Arc<dyn RetryPolicy>,
	cache: Arc<dyn TokenCache>,
	acquirer: Arc<dyn TokenAcquirer>,
	settings: GuardSettings,
	metrics: Arc<GuardMetrics>,
	acquire_lock: Arc<AsyncMutex<()>>,
}
impl TokenGuard {
	/// Creates a guard that acquires tokens with the client-credentials grant over `fetcher` and
	/// dispatches every request exactly once.
	pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<dyn TokenCache>) -> Self {
		let acquirer = Arc::new(ClientCredentialsAcquirer::new(fetcher.clone()));

		Self {
			fetcher,
			retry_policy: Arc::new(SingleAttempt),
			cache,
			acquirer,
			settings: GuardSettings::default(),
			metrics: Default::default(),
			acquire_lock: Default::default(),
		}
	}

	/// Creates a guard backed by a [`ReqwestFetcher`] built from `settings`.
	#[cfg(feature = "reqwest")]
	pub fn reqwest(settings: FetcherSettings, cache: Arc<dyn TokenCache>) -> Result<Self> {
		let fetcher = ReqwestFetcher::new(settings)?;

		Ok(Self::new(Arc::new(fetcher), cache))
	}

	/// Replaces the retry policy.
	pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
		self.retry_policy = policy;

		self
	}

	/// Replaces the token acquirer.
	pub fn with_acquirer(mut self, acquirer: Arc<dyn TokenAcquirer>) -> Self {
		self.acquirer = acquirer;

		self
	}

	/// Replaces the guard settings after validating them.
	pub fn with_settings(mut self, settings: GuardSettings) -> Result<Self> {
		settings.validate().map_err(ConfigError::from)?;

		self.settings = settings;

		Ok(self)
	}

	/// Settings the guard runs with.
	pub fn settings(&self) -> &GuardSettings {
		&self.settings
	}

	/// Token lifecycle counters.
	pub fn metrics(&self) -> &GuardMetrics {
		&self.metrics
	}

	/// Executes `request`, refreshing the access token up to the configured bound.
	///
	/// Requests whose auth type is not [`AuthType::Bearer`] carry no access token, so they skip
	/// the cache and the refresh loop and go straight to the retry policy.
	pub async fn execute(&self, request: &Request) -> Result<Response> {
		const KIND: FlowKind = FlowKind::GuardedRequest;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::trace_flow_failure(KIND, err);
			},
		}

		result
	}

	/// Executes `request` and deserializes the body with the request's API format.
	pub async fn execute_as<T>(&self, request: &Request) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.execute(request).await?;

		response.deserialize(request.config.api_format)
	}

	/// Returns the cached access token, acquiring and caching a new one on a miss.
	pub async fn access_token(&self, config: &RequestConfig) -> Result<AccessToken> {
		let key = self.settings.cache_key.as_str();

		if let Some(token) = self.cache.get(key).await? {
			return Ok(token);
		}
		if !self.settings.single_flight {
			return self.acquire_and_store(config).await;
		}

		let _guard = self.acquire_lock.lock().await;

		// Another task may have filled the cache while this one waited.
		if let Some(token) = self.cache.get(key).await? {
			return Ok(token);
		}

		self.acquire_and_store(config).await
	}

	async fn run(&self, request: &Request) -> Result<Response> {
		if request.config.auth_type != AuthType::Bearer {
			return self.retry_policy.get_response(self.fetcher.as_ref(), request).await;
		}

		let max_refreshes = self.settings.max_refresh_retries;
		let mut refreshes = 0;

		loop {
			let token = self.access_token(&request.config).await?;
			let attempt = request.with_access_token(token.clone());

			match self.retry_policy.get_response(self.fetcher.as_ref(), &attempt).await {
				Ok(response) => return Ok(response),
				Err(err) if err.is_invalid_access_token() => {
					if refreshes >= max_refreshes {
						self.metrics.record_exhausted();

						return Err(Error::NoRetriesLeft { attempts: refreshes, source: Box::new(err) });
					}

					refreshes += 1;

					obs::trace_token_refresh(refreshes, max_refreshes);
					obs::record_token_refresh();
					self.metrics.record_refresh();
					self.invalidate(&token).await?;
				},
				Err(err) => return Err(err),
			}
		}
	}

	async fn acquire_and_store(&self, config: &RequestConfig) -> Result<AccessToken> {
		obs::trace_cache_miss(&self.settings.cache_key);

		let token = self.acquirer.retrieve_access_token(config).await?;

		self.metrics.record_acquisition();
		self.cache.set(&self.settings.cache_key, token.clone()).await?;

		Ok(token)
	}

	// With single-flight on, only the token that was actually rejected is removed; a newer one
	// stored by a concurrent refresh stays.
	async fn invalidate(&self, stale: &AccessToken) -> Result<()> {
		let key = self.settings.cache_key.as_str();

		if !self.settings.single_flight {
			return Ok(self.cache.remove(key).await?);
		}

		let _guard = self.acquire_lock.lock().await;

		if self.cache.get(key).await?.as_ref() == Some(stale) {
			self.cache.remove(key).await?;
		}

		Ok(())
	}
}
impl Debug for TokenGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGuard")
			.field("settings", &self.settings)
			.field("metrics", &self.metrics)
			.finish()
	}
}
