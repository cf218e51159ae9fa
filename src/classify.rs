//! Rejection classification hooks that map non-success responses onto the error taxonomy.
//!
//! Fetchers hand every non-2xx response to a [`ResponseClassifier`], which decides whether it is
//! a token rejection, a transient condition, or something the pipeline should not touch. The
//! hook only sees plain data, so it stays independent of any HTTP client.

// crates.io
use http::{
	HeaderMap,
	header::{RETRY_AFTER, WWW_AUTHENTICATE},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::StatusError, request::Response};

/// Strategy hook that classifies rejected responses.
///
/// Override it when a service signals token expiry in an unusual way (for example a 403 with a
/// vendor error code).
pub trait ResponseClassifier: Send + Sync {
	/// Maps a rejected response into a [`RejectionKind`].
	fn classify(&self, ctx: &RejectionContext) -> RejectionKind;
}

/// Canonical rejection categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionKind {
	/// The access token is no longer accepted.
	InvalidAccessToken,
	/// HTTP 429-style throttling.
	Throttled,
	/// HTTP 503-style gateway unavailability.
	GatewayUnavailable,
	/// Anything else; surfaced as [`Error::UnexpectedStatus`].
	Unexpected,
}

/// Plain-data view of a rejected response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectionContext {
	/// HTTP status code.
	pub http_status: u16,
	/// `WWW-Authenticate` challenge, when present.
	pub www_authenticate: Option<String>,
	/// Preview of the response body.
	pub body_preview: Option<String>,
}
impl RejectionContext {
	/// Creates a context for the provided status.
	pub fn new(http_status: u16) -> Self {
		Self { http_status, www_authenticate: None, body_preview: None }
	}

	/// Adds the `WWW-Authenticate` challenge.
	pub fn with_www_authenticate(mut self, challenge: impl Into<String>) -> Self {
		self.www_authenticate = Some(challenge.into());

		self
	}

	/// Adds a body preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(body.into());

		self
	}
}

/// Default classifier: 401 or an `invalid_token` challenge means the token is stale, 429 is
/// throttling, 503 is gateway unavailability.
#[derive(Clone, Debug, Default)]
pub struct DefaultResponseClassifier;
impl ResponseClassifier for DefaultResponseClassifier {
	fn classify(&self, ctx: &RejectionContext) -> RejectionKind {
		match ctx.http_status {
			401 => RejectionKind::InvalidAccessToken,
			429 => RejectionKind::Throttled,
			503 => RejectionKind::GatewayUnavailable,
			400 | 403 if mentions_invalid_token(ctx) => RejectionKind::InvalidAccessToken,
			_ => RejectionKind::Unexpected,
		}
	}
}

fn mentions_invalid_token(ctx: &RejectionContext) -> bool {
	[ctx.www_authenticate.as_deref(), ctx.body_preview.as_deref()]
		.into_iter()
		.flatten()
		.any(|value| value.to_ascii_lowercase().contains("invalid_token"))
}

/// Passes 2xx responses through and converts everything else into a classified [`Error`].
///
/// Fetcher implementations call this once the body has been read.
pub fn classify_response(
	classifier: &dyn ResponseClassifier,
	response: Response,
) -> Result<Response> {
	if response.status.is_success() {
		return Ok(response);
	}

	let status = response.status.as_u16();
	let body = String::from_utf8_lossy(response.body()).into_owned();
	let cause = StatusError::new(status).with_body_preview(body);
	let mut ctx = RejectionContext::new(status);

	if let Some(challenge) =
		response.headers.get(WWW_AUTHENTICATE).and_then(|value| value.to_str().ok())
	{
		ctx = ctx.with_www_authenticate(challenge);
	}
	if let Some(preview) = &cause.body_preview {
		ctx = ctx.with_body_preview(preview.clone());
	}

	let retry_after = parse_retry_after(&response.headers);

	Err(match classifier.classify(&ctx) {
		RejectionKind::InvalidAccessToken => Error::InvalidAccessToken { source: cause },
		RejectionKind::Throttled => Error::Throttled { retry_after, source: cause },
		RejectionKind::GatewayUnavailable => Error::GatewayUnavailable { retry_after, source: cause },
		RejectionKind::Unexpected => Error::UnexpectedStatus(cause),
	})
}

/// Reads a `Retry-After` header expressed in seconds or as an HTTP date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Duration::try_from(delta).ok();
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{HeaderValue, StatusCode};
	// self
	use super::*;

	fn rejected(status: u16, headers: HeaderMap, body: &str) -> Error {
		let status = StatusCode::from_u16(status).expect("Test status should be valid.");

		classify_response(&DefaultResponseClassifier, Response::new(status, headers, body))
			.expect_err("Non-success responses should be rejected.")
	}

	#[test]
	fn success_passes_through() {
		let response = Response::new(StatusCode::NO_CONTENT, HeaderMap::new(), Vec::new());

		assert!(classify_response(&DefaultResponseClassifier, response).is_ok());
	}

	#[test]
	fn default_classifier_maps_reference_statuses() {
		assert!(matches!(
			rejected(401, HeaderMap::new(), "expired"),
			Error::InvalidAccessToken { .. }
		));
		assert!(matches!(rejected(429, HeaderMap::new(), ""), Error::Throttled { .. }));
		assert!(matches!(rejected(503, HeaderMap::new(), ""), Error::GatewayUnavailable { .. }));
		assert!(matches!(rejected(500, HeaderMap::new(), "boom"), Error::UnexpectedStatus(_)));
		assert!(matches!(rejected(403, HeaderMap::new(), "forbidden"), Error::UnexpectedStatus(_)));
	}

	#[test]
	fn invalid_token_challenge_is_recognized_on_403() {
		let mut headers = HeaderMap::new();

		headers.insert(
			WWW_AUTHENTICATE,
			HeaderValue::from_static("Bearer error=\"invalid_token\", error_description=\"expired\""),
		);

		assert!(matches!(rejected(403, headers, ""), Error::InvalidAccessToken { .. }));
		assert!(matches!(
			rejected(400, HeaderMap::new(), "{\"error\":\"INVALID_TOKEN\"}"),
			Error::InvalidAccessToken { .. }
		));
	}

	#[test]
	fn throttling_keeps_retry_after_and_body_preview() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));

		let err = rejected(429, headers, "slow down");

		assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));

		let Error::Throttled { source, .. } = err else {
			panic!("Expected a throttled error.");
		};

		assert_eq!(source.body_preview.as_deref(), Some("slow down"));
	}

	#[test]
	fn custom_classifier_can_flag_vendor_codes() {
		struct VendorClassifier;
		impl ResponseClassifier for VendorClassifier {
			fn classify(&self, ctx: &RejectionContext) -> RejectionKind {
				if ctx.body_preview.as_deref().is_some_and(|body| body.contains("SYSTEM_ERROR.GMP")) {
					RejectionKind::GatewayUnavailable
				} else {
					DefaultResponseClassifier.classify(ctx)
				}
			}
		}

		let response = Response::new(
			StatusCode::INTERNAL_SERVER_ERROR,
			HeaderMap::new(),
			"SYSTEM_ERROR.GMP",
		);
		let err = classify_response(&VendorClassifier, response)
			.expect_err("Vendor code should be rejected.");

		assert!(err.is_transient());
	}

	#[test]
	fn retry_after_ignores_garbage_and_past_dates() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn retry_after_accepts_future_http_dates() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Fri, 01 Jan 2100 00:00:00 GMT"));

		let delay = parse_retry_after(&headers).expect("Future HTTP dates should be honoured.");

		assert!(delay > Duration::from_secs(365 * 24 * 60 * 60));
	}
}
