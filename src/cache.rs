//! Token cache contract and built-in cache implementations.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// self
use crate::{_prelude::*, auth::AccessToken};

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key-value store holding the process-wide access token.
///
/// The cache enforces no expiry; a token disappears only when the guard removes it after the
/// remote service rejected it. Implementations may be in-memory, distributed, or persistent,
/// but must give read-after-write consistency to the caller that wrote and make a `remove`
/// visible to every subsequent `get`.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Fetches the token stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<AccessToken>>;

	/// Stores or replaces the token under `key`.
	fn set<'a>(&'a self, key: &'a str, token: AccessToken) -> CacheFuture<'a, ()>;

	/// Removes the token under `key`; removing a missing key is not an error.
	fn remove<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn cache_error_converts_into_crate_error_with_source() {
		let cache_error = CacheError::Backend { message: "redis unreachable".into() };
		let err: Error = cache_error.clone().into();

		assert!(matches!(err, Error::Cache(_)));
		assert!(err.to_string().contains("redis unreachable"));

		let source = err.source().expect("Crate error should expose the cache error as its source.");

		assert_eq!(source.to_string(), cache_error.to_string());
	}
}
