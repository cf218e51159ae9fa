//! Payload formats understood by requests, responses, and the token exchange.

// self
use crate::_prelude::*;

/// Wire format of a request body or response payload.
///
/// The format doubles as its own serializer: pick one from the request configuration and call
/// [`Format::serialize`] / [`Format::deserialize`] on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
	/// `application/json`.
	#[default]
	Json,
	/// `application/x-www-form-urlencoded`.
	FormUrlEncoded,
}
impl Format {
	/// MIME type used for `Content-Type` and `Accept` headers.
	pub const fn mime(self) -> &'static str {
		match self {
			Self::Json => "application/json",
			Self::FormUrlEncoded => "application/x-www-form-urlencoded",
		}
	}

	/// Serializes `value` into a payload string.
	pub fn serialize<T>(self, value: &T) -> Result<String, SerializationError>
	where
		T: ?Sized + Serialize,
	{
		match self {
			Self::Json => serde_json::to_string(value).map_err(SerializationError::JsonEncode),
			Self::FormUrlEncoded =>
				serde_urlencoded::to_string(value).map_err(SerializationError::FormEncode),
		}
	}

	/// Deserializes a payload string into `T`.
	pub fn deserialize<T>(self, payload: &str) -> Result<T, SerializationError>
	where
		T: DeserializeOwned,
	{
		match self {
			Self::Json => {
				let mut de = serde_json::Deserializer::from_str(payload);

				serde_path_to_error::deserialize(&mut de).map_err(SerializationError::JsonDecode)
			},
			Self::FormUrlEncoded =>
				serde_urlencoded::from_str(payload).map_err(SerializationError::FormDecode),
		}
	}
}
impl Display for Format {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.mime())
	}
}

/// Serialization failures for either supported format.
#[derive(Debug, ThisError)]
pub enum SerializationError {
	/// Value could not be encoded as JSON.
	#[error("Payload could not be encoded as JSON.")]
	JsonEncode(#[source] serde_json::Error),
	/// JSON payload did not match the expected shape.
	#[error("JSON payload is invalid at `{}`.", .0.path())]
	JsonDecode(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// Value could not be form-encoded.
	#[error("Payload could not be form-encoded.")]
	FormEncode(#[source] serde_urlencoded::ser::Error),
	/// Form payload did not match the expected shape.
	#[error("Form payload is invalid.")]
	FormDecode(#[source] serde_urlencoded::de::Error),
	/// Response body is not valid UTF-8.
	#[error("Payload is not valid UTF-8.")]
	Utf8(#[from] std::str::Utf8Error),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, PartialEq, Deserialize)]
	struct Grant {
		grant_type: String,
	}

	#[test]
	fn form_encoding_matches_token_exchange_body() {
		let body = Format::FormUrlEncoded
			.serialize(&[("grant_type", "client_credentials")])
			.expect("Form body should encode.");

		assert_eq!(body, "grant_type=client_credentials");

		let grant: Grant =
			Format::FormUrlEncoded.deserialize(&body).expect("Form body should decode.");

		assert_eq!(grant.grant_type, "client_credentials");
	}

	#[test]
	fn json_errors_report_the_failing_path() {
		let err = Format::Json
			.deserialize::<Grant>("{\"grant_type\":42}")
			.expect_err("Numeric grant type should be rejected.");

		assert!(matches!(err, SerializationError::JsonDecode(_)));
		assert_eq!(err.to_string(), "JSON payload is invalid at `grant_type`.");
	}

	#[test]
	fn mime_types_are_stable() {
		assert_eq!(Format::Json.mime(), "application/json");
		assert_eq!(Format::FormUrlEncoded.to_string(), "application/x-www-form-urlencoded");
	}
}
