//! Guard-level error types shared across the fetcher, retry, cache, and handler layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Variants are grouped by how the pipeline reacts to them: transient failures are retried by
/// the [`RetryPolicy`](crate::retry::RetryPolicy), invalid-token rejections feed the bounded
/// refresh loop of the [`TokenGuard`](crate::guard::TokenGuard), and everything else
/// propagates immediately.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Payload could not be serialized or deserialized.
	#[error(transparent)]
	Serialization(#[from] crate::serialize::SerializationError),
	/// Connection failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Connection(#[from] TransportError),

	/// Remote service throttled the call (HTTP 429).
	#[error("Remote service throttled the request.")]
	Throttled {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Rejected response.
		#[source]
		source: StatusError,
	},
	/// Gateway in front of the remote service is unavailable (HTTP 503).
	#[error("Remote gateway is unavailable.")]
	GatewayUnavailable {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Rejected response.
		#[source]
		source: StatusError,
	},
	/// Remote service no longer accepts the access token attached to the request.
	#[error("Remote service rejected the access token.")]
	InvalidAccessToken {
		/// Rejected response.
		#[source]
		source: StatusError,
	},
	/// The refresh loop exhausted its bound.
	#[error("Could not refresh the access token after {attempts} attempts.")]
	NoRetriesLeft {
		/// Number of refreshes performed before giving up.
		attempts: u32,
		/// Last invalid-token rejection.
		#[source]
		source: Box<Error>,
	},
	/// Identity endpoint rejected the client credentials.
	#[error("Identity endpoint rejected the client credentials.")]
	InvalidClient {
		/// Rejected response.
		#[source]
		source: StatusError,
	},
	/// Token endpoint answered with a payload that carries no usable token.
	#[error("Token endpoint returned a malformed response: {reason}.")]
	MalformedTokenResponse {
		/// What was wrong with the payload.
		reason: String,
	},
	/// Remote service answered with a status the pipeline does not handle.
	#[error(transparent)]
	UnexpectedStatus(StatusError),
}
impl Error {
	/// Returns the coarse classification of the error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Throttled { .. } => ErrorKind::Throttled,
			Self::GatewayUnavailable { .. } => ErrorKind::GatewayUnavailable,
			Self::Connection(_) => ErrorKind::Connection,
			Self::InvalidAccessToken { .. } => ErrorKind::InvalidAccessToken,
			Self::NoRetriesLeft { .. } => ErrorKind::NoRetriesLeft,
			Self::InvalidClient { .. } => ErrorKind::InvalidClient,
			Self::UnexpectedStatus(_) => ErrorKind::UnexpectedStatus,
			Self::Serialization(_) | Self::MalformedTokenResponse { .. } => ErrorKind::Payload,
			Self::Cache(_) => ErrorKind::Cache,
			Self::Config(_) => ErrorKind::Config,
		}
	}

	/// Whether a retry policy may replay the request after this error.
	pub fn is_transient(&self) -> bool {
		self.kind().is_transient()
	}

	/// Whether the error is the remote service rejecting the access token.
	pub fn is_invalid_access_token(&self) -> bool {
		matches!(self, Self::InvalidAccessToken { .. })
	}

	/// Upstream Retry-After hint, when the rejection carried one.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Throttled { retry_after, .. } | Self::GatewayUnavailable { retry_after, .. } =>
				*retry_after,
			_ => None,
		}
	}

	/// HTTP status of the rejected response, when the error originated from one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Throttled { source, .. }
			| Self::GatewayUnavailable { source, .. }
			| Self::InvalidAccessToken { source }
			| Self::InvalidClient { source }
			| Self::UnexpectedStatus(source) => Some(source.status),
			Self::NoRetriesLeft { source, .. } => source.status(),
			_ => None,
		}
	}
}

/// Coarse error classification callers can match on to apply their own policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// HTTP 429.
	Throttled,
	/// HTTP 503.
	GatewayUnavailable,
	/// Any other transport-level failure.
	Connection,
	/// Semantic token rejection.
	InvalidAccessToken,
	/// Refresh loop exhausted.
	NoRetriesLeft,
	/// Client credentials rejected by the identity endpoint.
	InvalidClient,
	/// Unhandled HTTP status.
	UnexpectedStatus,
	/// Serialization or malformed payload.
	Payload,
	/// Token cache failure.
	Cache,
	/// Local configuration problem.
	Config,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Throttled => "throttled",
			Self::GatewayUnavailable => "gateway_unavailable",
			Self::Connection => "connection",
			Self::InvalidAccessToken => "invalid_access_token",
			Self::NoRetriesLeft => "no_retries_left",
			Self::InvalidClient => "invalid_client",
			Self::UnexpectedStatus => "unexpected_status",
			Self::Payload => "payload",
			Self::Cache => "cache",
			Self::Config => "config",
		}
	}

	/// Throttling, gateway unavailability, and connection failures are transient.
	pub const fn is_transient(self) -> bool {
		matches!(self, Self::Throttled | Self::GatewayUnavailable | Self::Connection)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Non-success HTTP response captured for diagnostics.
///
/// Only the status and a bounded preview of the body are kept; request headers (and with them
/// credentials or bearer tokens) never reach this type.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Remote service responded with HTTP {status}.")]
pub struct StatusError {
	/// HTTP status code.
	pub status: u16,
	/// Truncated response body.
	pub body_preview: Option<String>,
}
impl StatusError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Captures a status without a body.
	pub fn new(status: u16) -> Self {
		Self { status, body_preview: None }
	}

	/// Attaches a body preview, truncating long payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		let body = body.into();

		self.body_preview = if body.is_empty() { None } else { Some(truncate_preview(body)) };

		self
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= StatusError::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= StatusError::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

/// Configuration and validation failures raised by the guard.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Settings failed validation.
	#[error(transparent)]
	Settings(#[from] crate::settings::SettingsError),
	/// Request endpoint cannot be joined onto the base URL.
	#[error("Endpoint `{endpoint}` does not form a valid URL.")]
	InvalidEndpoint {
		/// Endpoint path that failed to parse.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeaderValue {
		/// Header name.
		name: &'static str,
	},
	/// A bearer-authenticated request reached the transport without a token.
	#[error("Request requires an access token but none was attached.")]
	MissingAccessToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call did not complete within its timeout.
	#[error("Request timed out while calling the remote service.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn kinds_separate_transient_from_semantic_failures() {
		let throttled = Error::Throttled { retry_after: None, source: StatusError::new(429) };
		let unavailable =
			Error::GatewayUnavailable { retry_after: None, source: StatusError::new(503) };
		let invalid = Error::InvalidAccessToken { source: StatusError::new(401) };
		let io = Error::from(TransportError::Io(std::io::Error::other("reset")));

		assert!(throttled.is_transient());
		assert!(unavailable.is_transient());
		assert!(io.is_transient());
		assert!(!invalid.is_transient());
		assert!(invalid.is_invalid_access_token());
		assert_eq!(io.kind(), ErrorKind::Connection);
	}

	#[test]
	fn no_retries_left_reports_attempts_and_cause() {
		let cause = Error::InvalidAccessToken {
			source: StatusError::new(401).with_body_preview("token expired"),
		};
		let err = Error::NoRetriesLeft { attempts: 3, source: Box::new(cause) };

		assert_eq!(err.to_string(), "Could not refresh the access token after 3 attempts.");
		assert_eq!(err.kind(), ErrorKind::NoRetriesLeft);
		assert_eq!(err.status(), Some(401));

		let source = err.source().expect("No-retries-left should expose its cause.");

		assert_eq!(source.to_string(), "Remote service rejected the access token.");
	}

	#[test]
	fn retry_after_is_exposed_for_transient_statuses() {
		let err = Error::Throttled {
			retry_after: Some(Duration::from_secs(7)),
			source: StatusError::new(429),
		};

		assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
		assert_eq!(err.status(), Some(429));
	}

	#[test]
	fn body_preview_is_truncated() {
		let err = StatusError::new(500).with_body_preview("x".repeat(1_000));
		let preview = err.body_preview.expect("Preview should be captured.");

		assert_eq!(preview.chars().count(), StatusError::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
		assert_eq!(StatusError::new(500).with_body_preview("").body_preview, None);
	}
}
