//! Coin balances, history, and GraphQL queries.

// self
use crate::{
	_prelude::*,
	client::Client,
	request::RequestSpec,
	transport::GatewayHttpClient,
	value::{Map, Value},
};

/// Coin service; every call is signed, including reads.
#[derive(Clone, Debug)]
pub struct CoinService<C>
where
	C: ?Sized + GatewayHttpClient,
{
	client: Client<C>,
}
impl<C> CoinService<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Wraps `client`, forcing secure mode.
	pub fn new(client: Client<C>) -> Self {
		Self { client: client.into_secure() }
	}

	/// Returns the underlying client.
	pub fn client(&self) -> &Client<C> {
		&self.client
	}

	/// Current score of `name`.
	pub async fn score(&self, name: &str) -> Result<JsonValue> {
		self.client
			.request_json_field(RequestSpec::get(format!("/api/coins/{name}/score/")), "score")
			.await
	}

	/// Stored info object of `name`.
	pub async fn info(&self, name: &str) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::get(info_path(name))).await
	}

	/// Replaces the info object of `name`.
	pub async fn put_info(&self, name: &str, info: Map) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::put(info_path(name)).json(info)).await
	}

	/// Drops every coin record of `name`.
	pub async fn drop_coin(&self, name: &str) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::post(format!("/api/coins/{name}/drop/"))).await
	}

	/// Paged coin records of `name`, filtered by `query` (`from`, `size`, ...).
	pub async fn list(&self, name: &str, query: Map) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::get(coins_path(name)).query(query)).await
	}

	/// Paged coin history across names.
	pub async fn history(&self, query: Map) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::get("/api/coins_history/").query(query)).await
	}

	/// Records a coin change for `name` and returns the resulting score.
	pub async fn save(&self, name: &str, form: Map) -> Result<JsonValue> {
		self.client.request_json_field(RequestSpec::post(coins_path(name)).form(form), "score").await
	}

	/// Runs a GraphQL query across coins.
	pub async fn graphql(&self, query: &str) -> Result<JsonValue> {
		self.client.request_json(graphql_spec("/api/graphql/".into(), query)).await
	}

	/// Runs a GraphQL query scoped to `name`.
	pub async fn graphql_by_name(&self, name: &str, query: &str) -> Result<JsonValue> {
		self.client.request_json(graphql_spec(format!("/api/graphql/{name}/"), query)).await
	}
}

fn coins_path(name: &str) -> String {
	format!("/api/coins/{name}/")
}

fn info_path(name: &str) -> String {
	format!("/api/coins/{name}/info/")
}

pub(crate) fn graphql_spec(pathname: String, query: &str) -> RequestSpec {
	RequestSpec::post(pathname).form(Map::from([("query".to_owned(), Value::from(query))]))
}
