//! Typed settings for the transport and the token guard.
//!
//! Both structs are serde-friendly so callers can load them from whatever configuration source
//! they already use; the builders validate the invariants the pipeline relies on.

// self
use crate::{_prelude::*, error::ConfigError};

/// Errors raised while validating settings.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SettingsError {
	/// Base URL must use HTTP(S).
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a query or fragment since endpoints are appended to it.
	#[error("The base URL must not carry a query or fragment: {url}.")]
	BaseUrlNotJoinable {
		/// URL that failed validation.
		url: String,
	},
	/// Timeouts must be positive.
	#[error("The request timeout must be greater than zero.")]
	ZeroTimeout,
	/// Cache key cannot be blank.
	#[error("The token cache key must not be empty.")]
	EmptyCacheKey,
}

/// Transport settings consumed by [`ReqwestFetcher`](crate::http::ReqwestFetcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherSettings {
	/// Base URL every endpoint path is appended to.
	pub base_url: Url,
	/// Timeout applied when the request configuration does not carry its own.
	pub timeout: Duration,
	/// Optional `User-Agent` override.
	pub user_agent: Option<String>,
}
impl FetcherSettings {
	/// Timeout applied when none is configured.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> FetcherSettingsBuilder {
		FetcherSettingsBuilder::new(base_url)
	}

	/// Joins an endpoint path (and optional query pairs) onto the base URL.
	pub fn endpoint_url(&self, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = endpoint.trim_start_matches('/');
		let mut url = Url::parse(&format!("{base}/{path}")).map_err(|source| {
			ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source }
		})?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}

	fn validate(&self) -> Result<(), SettingsError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(SettingsError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(SettingsError::BaseUrlNotJoinable { url: self.base_url.to_string() });
		}
		if self.timeout.is_zero() {
			return Err(SettingsError::ZeroTimeout);
		}

		Ok(())
	}
}

/// Builder for [`FetcherSettings`] values.
#[derive(Debug)]
pub struct FetcherSettingsBuilder {
	base_url: Url,
	timeout: Duration,
	user_agent: Option<String>,
}
impl FetcherSettingsBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, timeout: FetcherSettings::DEFAULT_TIMEOUT, user_agent: None }
	}

	/// Overrides the default request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Sets the `User-Agent` header sent with every request.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting settings.
	pub fn build(self) -> Result<FetcherSettings, SettingsError> {
		let settings = FetcherSettings {
			base_url: self.base_url,
			timeout: self.timeout,
			user_agent: self.user_agent,
		};

		settings.validate()?;

		Ok(settings)
	}
}

/// Behavior knobs for [`TokenGuard`](crate::guard::TokenGuard).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSettings {
	/// Cache key holding the process-wide access token.
	pub cache_key: String,
	/// Maximum number of refreshes per top-level request.
	pub max_refresh_retries: u32,
	/// Serializes concurrent acquisitions so a cache miss triggers one token exchange.
	pub single_flight: bool,
}
impl GuardSettings {
	/// Cache key used when none is configured.
	pub const DEFAULT_CACHE_KEY: &'static str = "access_token";
	/// Refresh bound used when none is configured.
	pub const DEFAULT_MAX_REFRESH_RETRIES: u32 = 3;

	/// Overrides the cache key.
	pub fn with_cache_key(mut self, key: impl Into<String>) -> Result<Self, SettingsError> {
		let key = key.into();

		if key.trim().is_empty() {
			return Err(SettingsError::EmptyCacheKey);
		}

		self.cache_key = key;

		Ok(self)
	}

	/// Overrides the refresh bound.
	pub fn with_max_refresh_retries(mut self, max: u32) -> Self {
		self.max_refresh_retries = max;

		self
	}

	/// Enables or disables single-flight acquisition.
	pub fn with_single_flight(mut self, enabled: bool) -> Self {
		self.single_flight = enabled;

		self
	}

	/// Checks settings that were assembled without the builders, e.g. deserialized ones.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.cache_key.trim().is_empty() {
			return Err(SettingsError::EmptyCacheKey);
		}

		Ok(())
	}
}
impl Default for GuardSettings {
	fn default() -> Self {
		Self {
			cache_key: Self::DEFAULT_CACHE_KEY.into(),
			max_refresh_retries: Self::DEFAULT_MAX_REFRESH_RETRIES,
			single_flight: true,
		}
	}
}
