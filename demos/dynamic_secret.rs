//! Signs requests with short-lived secrets issued by an external fetcher.
//!
//! 1. Wrap an async closure in [`FnSecretFetcher`]; it receives the method and pathname.
//! 2. Share one [`SecretCache`] between clients so identical calls reuse an issued secret.
//! 3. Requests signed this way carry `X-REQUEST-TYPE: JSAPI` and the secret's nonce.

// std
use std::{
	io,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::OffsetDateTime;
// self
use yuntan_gateway::{
	client::Client,
	config::GatewayConfig,
	reqwest::Method,
	request::RequestSpec,
	secret::{DynamicSecret, FnSecretFetcher, SecretCache},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let delete_mock = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/file/report.pdf")
				.header("x-request-type", "JSAPI")
				.header_exists("x-request-nonce");
			then.status(200).header("content-type", "application/json").body(r#"{"result":"OK"}"#);
		})
		.await;
	let issued = Arc::new(AtomicU64::new(0));
	let counter = issued.clone();
	let fetcher = FnSecretFetcher::new(move |method: Method, pathname: String| {
		let counter = counter.clone();

		async move {
			let n = counter.fetch_add(1, Ordering::SeqCst);

			println!("issuing secret #{n} for {method} {pathname}");

			Ok::<_, io::Error>(DynamicSecret::new(
				format!("nonce-{n}"),
				format!("secret-{n}"),
				OffsetDateTime::now_utc().unix_timestamp(),
			))
		}
	});
	let cache = Arc::new(SecretCache::new());
	let config = GatewayConfig::builder("demo-key").host(server.base_url()).build()?;
	let client = Client::new(config).with_secret_fetcher(fetcher, cache.clone());
	let spec = RequestSpec::delete("/file/report.pdf");

	for _ in 0..3 {
		let result = client.request_json(spec.clone()).await?;

		println!("delete -> {result}");
	}

	delete_mock.assert_hits_async(3).await;

	println!("secrets issued: {}, cached: {}", issued.load(Ordering::SeqCst), cache.len());

	Ok(())
}
