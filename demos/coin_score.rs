//! Reads and updates a coin balance through [`CoinService`] against a local mock gateway.
//!
//! Coin calls are always signed, so both the `GET` score lookup and the `POST` save carry
//! `X-REQUEST-SIGNATURE` and `X-REQUEST-TIME`.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use yuntan_gateway::{
	client::Client,
	config::GatewayConfig,
	service::CoinService,
	value::{Value, map},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let score_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/coins/alice/score/").header_exists("x-request-signature");
			then.status(200).header("content-type", "application/json").body(r#"{"score":42}"#);
		})
		.await;
	let save_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/coins/alice/")
				.header("x-request-key", "demo-key")
				.header_exists("x-request-signature");
			then.status(200).header("content-type", "application/json").body(r#"{"score":52}"#);
		})
		.await;
	let config =
		GatewayConfig::builder("demo-key").host(server.base_url()).secret("demo-secret").build()?;
	let coins = CoinService::new(Client::new(config));
	let before = coins.score("alice").await?;
	let after = coins
		.save(
			"alice",
			map([
				("score", Value::from(10)),
				("type", Value::from("Incr")),
				("desc", Value::from("daily bonus")),
			]),
		)
		.await?;

	score_mock.assert_async().await;
	save_mock.assert_async().await;

	println!("alice: {before} -> {after}");

	Ok(())
}
