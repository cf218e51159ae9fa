//! Successful HTTP exchange handed back to callers.

// crates.io
use http::{HeaderMap, StatusCode};
// self
use crate::{_prelude::*, serialize::Format};

/// Status, headers, and raw payload of a completed exchange.
///
/// The body stays as bytes until the caller asks for it as text or as a typed value.
#[derive(Clone, Debug)]
pub struct Response {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	body: Vec<u8>,
}
impl Response {
	/// Assembles a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Raw payload bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Payload decoded as UTF-8.
	pub fn payload_as_str(&self) -> Result<&str> {
		Ok(std::str::from_utf8(&self.body).map_err(crate::serialize::SerializationError::from)?)
	}

	/// Deserializes the payload with `format`.
	pub fn deserialize<T>(&self, format: Format) -> Result<T>
	where
		T: DeserializeOwned,
	{
		Ok(format.deserialize(self.payload_as_str()?)?)
	}

	/// Consumes the response and returns the payload bytes.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payload_is_materialized_on_demand() {
		let response = Response::new(StatusCode::OK, HeaderMap::new(), "{\"id\":7}");

		#[derive(Deserialize)]
		struct Item {
			id: u32,
		}

		assert_eq!(response.payload_as_str().expect("Payload should be UTF-8."), "{\"id\":7}");
		assert_eq!(response.deserialize::<Item>(Format::Json).expect("Payload should parse.").id, 7);
	}

	#[test]
	fn invalid_utf8_is_a_serialization_error() {
		let response = Response::new(StatusCode::OK, HeaderMap::new(), vec![0xff, 0xfe]);
		let err = response.payload_as_str().expect_err("Invalid UTF-8 should be rejected.");

		assert!(matches!(err, Error::Serialization(_)));
	}
}
