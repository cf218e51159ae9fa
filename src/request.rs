//! Transport-agnostic request model and its per-call configuration.
//!
//! A [`Request`] is an immutable description of one logical call. The guard derives a fresh copy
//! carrying the current access token for every attempt ([`Request::with_access_token`]), and
//! fetchers regenerate the wire-level headers from it each time they dispatch
//! ([`Request::transport_headers`]), so nothing tied to a previous attempt is ever replayed.

pub mod response;

pub use response::*;

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials},
	error::ConfigError,
	serialize::Format,
};

/// Header carrying the logical service name the call targets.
pub const SERVICE_NAME_HEADER: &str = "wm_svc.name";
/// Header carrying the caller-supplied correlation identifier.
pub const CORRELATION_ID_HEADER: &str = "wm_qos.correlation_id";

/// How a request authenticates against the remote service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
	/// Bootstrap token exchange: client credentials via HTTP Basic, never a bearer token.
	OAuth,
	/// Regular API call authenticated with the cached access token.
	#[default]
	Bearer,
	/// No authentication header.
	None,
}

/// Per-call configuration: target service, formats, authentication, and the active token.
#[derive(Clone, Debug)]
pub struct RequestConfig {
	/// Caller-owned credentials, shared rather than copied.
	pub credentials: Arc<Credentials>,
	/// Logical service the call targets.
	pub service_name: String,
	/// Format of the request body.
	pub content_type: Format,
	/// Format of the response payload.
	pub api_format: Format,
	/// Authentication mode.
	pub auth_type: AuthType,
	/// Token attached to this attempt; set by the guard.
	pub access_token: Option<AccessToken>,
	/// Optional correlation identifier forwarded as a header.
	pub correlation_id: Option<String>,
	/// Per-call timeout overriding the fetcher default.
	pub timeout: Option<Duration>,
}
impl RequestConfig {
	/// Creates a bearer-authenticated JSON configuration for `service_name`.
	pub fn new(credentials: Arc<Credentials>, service_name: impl Into<String>) -> Self {
		Self {
			credentials,
			service_name: service_name.into(),
			content_type: Format::Json,
			api_format: Format::Json,
			auth_type: AuthType::Bearer,
			access_token: None,
			correlation_id: None,
			timeout: None,
		}
	}

	/// Overrides the request body format.
	pub fn with_content_type(mut self, format: Format) -> Self {
		self.content_type = format;

		self
	}

	/// Overrides the response payload format.
	pub fn with_api_format(mut self, format: Format) -> Self {
		self.api_format = format;

		self
	}

	/// Overrides the authentication mode.
	pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
		self.auth_type = auth_type;

		self
	}

	/// Attaches a correlation identifier.
	pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
		self.correlation_id = Some(id.into());

		self
	}

	/// Overrides the timeout for calls made with this configuration.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns a copy of the configuration carrying `token`.
	pub fn with_access_token(&self, token: AccessToken) -> Self {
		Self { access_token: Some(token), ..self.clone() }
	}
}

/// Immutable description of one logical call.
#[derive(Clone, Debug)]
pub struct Request {
	/// Per-call configuration.
	pub config: RequestConfig,
	/// HTTP method.
	pub method: Method,
	/// Endpoint path appended to the fetcher's base URL.
	pub endpoint: String,
	/// Query pairs.
	pub query: Vec<(String, String)>,
	/// Caller-supplied headers; authentication and format headers are added at dispatch.
	pub headers: HeaderMap,
	/// Serialized body.
	pub payload: Option<String>,
}
impl Request {
	/// Creates a request without query, headers, or body.
	pub fn new(config: RequestConfig, method: Method, endpoint: impl Into<String>) -> Self {
		Self {
			config,
			method,
			endpoint: endpoint.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			payload: None,
		}
	}

	/// Appends a query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Adds a caller-supplied header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a pre-serialized body.
	pub fn with_raw_payload(mut self, payload: impl Into<String>) -> Self {
		self.payload = Some(payload.into());

		self
	}

	/// Serializes `value` with the configured content type and sets it as the body.
	pub fn with_payload<T>(mut self, value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.payload = Some(self.config.content_type.serialize(value)?);

		Ok(self)
	}

	/// Returns the per-attempt copy of this request carrying `token`.
	pub fn with_access_token(&self, token: AccessToken) -> Self {
		Self { config: self.config.with_access_token(token), ..self.clone() }
	}

	/// Renders the full header set for one dispatch.
	///
	/// `OAuth` requests carry the client credentials as HTTP Basic; `Bearer` requests require an
	/// attached token and fail with [`ConfigError::MissingAccessToken`] otherwise.
	pub fn transport_headers(&self) -> Result<HeaderMap> {
		let mut headers = self.headers.clone();

		if self.payload.is_some() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.config.content_type.mime()));
		}

		headers.insert(ACCEPT, HeaderValue::from_static(self.config.api_format.mime()));
		headers.insert(
			HeaderName::from_static(SERVICE_NAME_HEADER),
			header_value(SERVICE_NAME_HEADER, &self.config.service_name, false)?,
		);

		if let Some(id) = &self.config.correlation_id {
			headers.insert(
				HeaderName::from_static(CORRELATION_ID_HEADER),
				header_value(CORRELATION_ID_HEADER, id, false)?,
			);
		}

		match self.config.auth_type {
			AuthType::OAuth => {
				let value = self.config.credentials.basic_authorization();

				headers.insert(AUTHORIZATION, header_value("authorization", &value, true)?);
			},
			AuthType::Bearer => {
				let token =
					self.config.access_token.as_ref().ok_or(ConfigError::MissingAccessToken)?;
				let value = format!("Bearer {}", token.expose());

				headers.insert(AUTHORIZATION, header_value("authorization", &value, true)?);
			},
			AuthType::None => {},
		}

		Ok(headers)
	}
}

fn header_value(name: &'static str, value: &str, sensitive: bool) -> Result<HeaderValue> {
	let mut value =
		HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeaderValue { name })?;

	value.set_sensitive(sensitive);

	Ok(value)
}
