//! Access-token wrapper that redacts sensitive material, plus the token-endpoint payload.

// self
use crate::_prelude::*;

/// Opaque bearer token with no locally-known expiry.
///
/// Formatting never prints the token; use [`AccessToken::expose`] to read it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Payload returned by the token endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	pub access_token: String,
	/// Token type reported by the identity endpoint (usually `Bearer`).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Lifetime hint in seconds; informational only, expiry is detected reactively.
	#[serde(default)]
	pub expires_in: Option<u64>,
}
impl TokenResponse {
	/// Extracts the access token, rejecting empty values.
	pub fn into_access_token(self) -> Result<AccessToken> {
		let token = self.access_token.trim();

		if token.is_empty() {
			return Err(Error::MalformedTokenResponse { reason: "access_token is empty".into() });
		}

		Ok(AccessToken::new(token))
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::serialize::Format;

	#[test]
	fn token_formatters_redact() {
		let token = AccessToken::new("super-secret");

		assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
	}

	#[test]
	fn token_response_extracts_access_token() {
		let response: TokenResponse = Format::Json
			.deserialize("{\"access_token\":\"tok1\",\"token_type\":\"Bearer\",\"expires_in\":900}")
			.expect("Token payload should deserialize.");

		assert!(!format!("{response:?}").contains("tok1"));
		assert_eq!(
			response.into_access_token().expect("Token should be present.").expose(),
			"tok1"
		);
	}

	#[test]
	fn empty_access_token_is_malformed() {
		let response: TokenResponse = Format::Json
			.deserialize("{\"access_token\":\"  \"}")
			.expect("Token payload should deserialize.");
		let err = response.into_access_token().expect_err("Blank tokens must be rejected.");

		assert!(matches!(err, Error::MalformedTokenResponse { .. }));
	}
}
