//! Transport primitives: the [`Fetcher`] contract and its reqwest-backed implementation.
//!
//! A fetcher performs exactly one HTTP exchange per call. It renders the wire headers from the
//! [`Request`] every time (see [`Request::transport_headers`]), applies the request or default
//! timeout, and runs non-2xx responses through a [`ResponseClassifier`] so callers always see a
//! classified [`Error`]. Retrying is never the fetcher's job.

// self
use crate::{
	_prelude::*,
	request::{Request, Response},
};
#[cfg(feature = "reqwest")]
use crate::{
	classify::{self, DefaultResponseClassifier, ResponseClassifier},
	error::{ConfigError, TransportError},
	settings::FetcherSettings,
};

/// Boxed future returned by [`Fetcher::execute`] and the retry policies built on top of it.
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Performs a single HTTP exchange for a fully-formed request.
///
/// Implementations must be `Send + Sync` so one fetcher can serve the guard, the token
/// acquirer, and every concurrent request. Non-success responses must be reported through the
/// error taxonomy (use [`classify_response`](crate::classify::classify_response)), and every
/// call must honour a timeout, reporting expiry as [`Error::Connection`].
pub trait Fetcher: Send + Sync {
	/// Executes `request` once.
	fn execute<'a>(&'a self, request: &'a Request) -> FetchFuture<'a, Response>;
}

/// [`Fetcher`] backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestFetcher {
	client: ReqwestClient,
	settings: FetcherSettings,
	classifier: Arc<dyn ResponseClassifier>,
}
#[cfg(feature = "reqwest")]
impl ReqwestFetcher {
	/// Builds a fetcher with a fresh client configured from `settings`.
	pub fn new(settings: FetcherSettings) -> Result<Self> {
		let mut builder = ReqwestClient::builder();

		if let Some(agent) = &settings.user_agent {
			builder = builder.user_agent(agent.as_str());
		}

		let client = builder.build().map_err(ConfigError::from)?;

		Ok(Self::with_client(client, settings))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, settings: FetcherSettings) -> Self {
		Self { client, settings, classifier: Arc::new(DefaultResponseClassifier) }
	}

	/// Replaces the response classifier.
	pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Settings the fetcher was built with.
	pub fn settings(&self) -> &FetcherSettings {
		&self.settings
	}

	async fn dispatch(&self, request: &Request) -> Result<Response> {
		let url = self.settings.endpoint_url(&request.endpoint, &request.query)?;
		let headers = request.transport_headers()?;
		let mut builder = self
			.client
			.request(request.method.clone(), url)
			.headers(headers)
			.timeout(request.config.timeout.unwrap_or(self.settings.timeout));

		if let Some(payload) = &request.payload {
			builder = builder.body(payload.clone());
		}

		let response = builder.send().await.map_err(map_reqwest_error)?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let body = response.bytes().await.map_err(map_reqwest_error)?;

		classify::classify_response(
			self.classifier.as_ref(),
			Response::new(status, headers, body.to_vec()),
		)
	}
}
#[cfg(feature = "reqwest")]
impl Fetcher for ReqwestFetcher {
	fn execute<'a>(&'a self, request: &'a Request) -> FetchFuture<'a, Response> {
		Box::pin(self.dispatch(request))
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestFetcher").field("settings", &self.settings).finish()
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}
