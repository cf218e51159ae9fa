//! Access-token acquisition via the OAuth 2.0 client-credentials grant.
//!
//! [`ClientCredentialsAcquirer`] posts `grant_type=client_credentials` to the identity
//! endpoint with the caller's credentials as HTTP Basic auth. The exchange goes straight to the
//! [`Fetcher`]: it must never pass through the retry policy or the token guard, because it is the
//! one call that cannot carry an access token itself.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenResponse},
	http::{FetchFuture, Fetcher},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{AuthType, Request, RequestConfig},
	serialize::Format,
};

/// Produces fresh access tokens.
pub trait TokenAcquirer: Send + Sync {
	/// Performs a token exchange for the identity described by `config`.
	fn retrieve_access_token<'a>(
		&'a self,
		config: &'a RequestConfig,
	) -> FetchFuture<'a, AccessToken>;
}

/// Client-credentials token exchange against `POST /v3/token`.
#[derive(Clone)]
pub struct ClientCredentialsAcquirer {
	fetcher: Arc<dyn Fetcher>,
	token_endpoint: String,
}
impl ClientCredentialsAcquirer {
	/// Default identity endpoint path.
	pub const DEFAULT_TOKEN_ENDPOINT: &'static str = "/v3/token";
	/// Grant requested from the identity endpoint.
	pub const GRANT_TYPE: &'static str = "client_credentials";

	/// Creates an acquirer that dispatches through `fetcher`.
	pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
		Self { fetcher, token_endpoint: Self::DEFAULT_TOKEN_ENDPOINT.into() }
	}

	/// Overrides the identity endpoint path.
	pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.token_endpoint = endpoint.into();

		self
	}

	/// Builds the token-exchange request for the identity behind `config`.
	///
	/// Only the credentials, service name, correlation id, and timeout are carried over; the
	/// exchange always sends a form body, expects JSON back, and authenticates with `OAuth`.
	pub fn token_request(&self, config: &RequestConfig) -> Result<Request> {
		let mut token_config = RequestConfig::new(config.credentials.clone(), &config.service_name)
			.with_content_type(Format::FormUrlEncoded)
			.with_api_format(Format::Json)
			.with_auth_type(AuthType::OAuth);

		token_config.correlation_id = config.correlation_id.clone();
		token_config.timeout = config.timeout;

		Request::new(token_config, Method::POST, &self.token_endpoint)
			.with_payload(&[("grant_type", Self::GRANT_TYPE)])
	}

	async fn exchange(&self, config: &RequestConfig) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::TokenAcquisition;

		let span = FlowSpan::new(KIND, "retrieve_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.token_request(config)?;
				let response =
					self.fetcher.execute(&request).await.map_err(map_exchange_error)?;
				let payload: TokenResponse = response.deserialize(request.config.api_format)?;

				payload.into_access_token()
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::trace_flow_failure(KIND, err);
			},
		}

		result
	}
}
impl TokenAcquirer for ClientCredentialsAcquirer {
	fn retrieve_access_token<'a>(
		&'a self,
		config: &'a RequestConfig,
	) -> FetchFuture<'a, AccessToken> {
		Box::pin(self.exchange(config))
	}
}
impl Debug for ClientCredentialsAcquirer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsAcquirer")
			.field("token_endpoint", &self.token_endpoint)
			.finish()
	}
}

// A 401 from the identity endpoint is a credential problem, not a stale token.
fn map_exchange_error(err: Error) -> Error {
	match err {
		Error::InvalidAccessToken { source } => Error::InvalidClient { source },
		other => other,
	}
}
