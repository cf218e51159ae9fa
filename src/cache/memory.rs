//! Thread-safe in-memory [`TokenCache`] implementation.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	cache::{CacheError, CacheFuture, TokenCache},
};

type CacheMap = Arc<RwLock<HashMap<String, AccessToken>>>;

/// Process-local cache; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	fn get_now(map: &CacheMap, key: &str) -> Option<AccessToken> {
		map.read().get(key).cloned()
	}

	fn set_now(map: &CacheMap, key: &str, token: AccessToken) -> Result<(), CacheError> {
		map.write().insert(key.to_owned(), token);

		Ok(())
	}

	fn remove_now(map: &CacheMap, key: &str) -> Result<(), CacheError> {
		map.write().remove(key);

		Ok(())
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<AccessToken>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, key)) })
	}

	fn set<'a>(&'a self, key: &'a str, token: AccessToken) -> CacheFuture<'a, ()> {
		Box::pin(async move { Self::set_now(&self.0, key, token) })
	}

	fn remove<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
		Box::pin(async move { Self::remove_now(&self.0, key) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn set_get_remove_round_trip() {
		let cache = MemoryCache::default();

		assert_eq!(cache.get("access_token").await.expect("Get should succeed."), None);

		cache.set("access_token", AccessToken::new("tok1")).await.expect("Set should succeed.");

		assert_eq!(
			cache.get("access_token").await.expect("Get should succeed."),
			Some(AccessToken::new("tok1"))
		);

		cache.remove("access_token").await.expect("Remove should succeed.");
		cache.remove("access_token").await.expect("Removing a missing key should succeed.");

		assert_eq!(cache.get("access_token").await.expect("Get should succeed."), None);
	}

	#[tokio::test]
	async fn clones_share_state() {
		let cache = MemoryCache::default();
		let other = cache.clone();

		cache.set("access_token", AccessToken::new("shared")).await.expect("Set should succeed.");

		assert_eq!(
			other.get("access_token").await.expect("Get should succeed.").map(|t| t.expose().to_owned()),
			Some("shared".to_owned())
		);
	}
}
