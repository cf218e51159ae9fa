#![cfg(feature = "reqwest")]

// std
use std::{env, fs, path::PathBuf, process, sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use oauth2_guard::{
	auth::Credentials,
	cache::FileCache,
	guard::TokenGuard,
	http_types::Method,
	request::{Request, RequestConfig},
	settings::{FetcherSettings, GuardSettings},
	url::Url,
};

fn snapshot_path() -> PathBuf {
	env::temp_dir().join(format!("oauth2_guard_file_cache_it_{}.json", process::id()))
}

fn guard(server: &MockServer, path: &PathBuf) -> TokenGuard {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let settings = FetcherSettings::builder(base)
		.timeout(Duration::from_secs(5))
		.build()
		.expect("Fetcher settings should build.");
	let cache = Arc::new(FileCache::open(path).expect("File cache should open."));
	let guard_settings = GuardSettings::default()
		.with_cache_key("marketplace")
		.expect("Cache key should be accepted.");

	TokenGuard::reqwest(settings, cache)
		.expect("Guard should build.")
		.with_settings(guard_settings)
		.expect("Guard settings should be accepted.")
}

#[tokio::test]
async fn persisted_token_survives_a_restart() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v3/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"persisted\"}");
		})
		.await;
	let items_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/items").header("authorization", "Bearer persisted");
			then.status(200);
		})
		.await;
	let path = snapshot_path();
	let credentials = Arc::new(Credentials::new("client-id", "client-secret"));
	let request = Request::new(RequestConfig::new(credentials, "svc"), Method::GET, "/v3/items");

	guard(&server, &path).execute(&request).await.expect("First process should succeed.");
	guard(&server, &path).execute(&request).await.expect("Restarted process should succeed.");

	token_mock.assert_calls_async(1).await;
	items_mock.assert_calls_async(2).await;

	let snapshot = fs::read_to_string(&path).expect("Snapshot should exist.");

	assert!(snapshot.contains("marketplace"));

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary cache snapshot {}: {e}", path.display())
	});
}
