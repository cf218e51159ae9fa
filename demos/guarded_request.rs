//! Demonstrates a token-guarded request against a mock marketplace: an expired cached token is
//! rejected, the guard exchanges client credentials for a fresh one, and the retried call
//! succeeds. A backoff policy is installed so throttled responses would be retried.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_guard::{
	auth::{AccessToken, Credentials},
	cache::{MemoryCache, TokenCache},
	guard::TokenGuard,
	http_types::Method,
	request::{Request, RequestConfig},
	retry::BackoffPolicy,
	settings::{FetcherSettings, GuardSettings},
};

#[derive(Debug, serde::Deserialize)]
struct Inventory {
	sku: String,
	quantity: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v3/token").body("grant_type=client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}");
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/inventory").header("authorization", "Bearer expired");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/inventory").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"sku\":\"DEMO-1\",\"quantity\":42}");
		})
		.await;

	let cache = Arc::new(MemoryCache::default());

	// Pretend a previous run left an expired token behind.
	cache.set(GuardSettings::DEFAULT_CACHE_KEY, AccessToken::new("expired")).await?;

	let settings = FetcherSettings::builder(Url::parse(&server.base_url())?)
		.timeout(Duration::from_secs(10))
		.user_agent("oauth2-guard-demo")
		.build()?;
	let guard = TokenGuard::reqwest(settings, cache)?
		.with_retry_policy(Arc::new(BackoffPolicy::new(3)));
	let credentials = Arc::new(Credentials::new("demo-client", "super-secret"));
	let request = Request::new(
		RequestConfig::new(credentials, "Walmart Marketplace").with_correlation_id("demo-1"),
		Method::GET,
		"/v3/inventory",
	)
	.with_query("sku", "DEMO-1");
	let inventory: Inventory = guard.execute_as(&request).await?;

	println!("{} units of {} available.", inventory.quantity, inventory.sku);
	println!("Token refreshes: {}.", guard.metrics().refreshes());

	token_mock.assert_async().await;

	Ok(())
}
