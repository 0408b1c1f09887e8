//! User accounts: listing, creation, credentials, and extra data.

// self
use crate::{
	_prelude::*,
	client::Client,
	request::RequestSpec,
	service::coin::graphql_spec,
	transport::GatewayHttpClient,
	value::{self, Map},
};

/// User service; every call is signed, including reads.
#[derive(Clone, Debug)]
pub struct UserService<C>
where
	C: ?Sized + GatewayHttpClient,
{
	client: Client<C>,
}
impl<C> UserService<C>
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

	/// Paged user list.
	pub async fn list(&self, from: u64, size: u64) -> Result<JsonValue> {
		let query = value::map([("from", from), ("size", size)]);

		self.client.request_json(RequestSpec::get("/api/users/").query(query)).await
	}

	/// Creates a user.
	pub async fn create(&self, username: &str, passwd: &str) -> Result<JsonValue> {
		let form = value::map([("username", username), ("passwd", passwd)]);

		self.client.request_json(RequestSpec::post("/api/users/").form(form)).await
	}

	/// Fetches a user by id or name.
	pub async fn get(&self, uid_or_name: &str) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::get(user_path(uid_or_name, ""))).await
	}

	/// Removes a user.
	pub async fn remove(&self, uid_or_name: &str) -> Result<JsonValue> {
		self.client.request_json(RequestSpec::delete(user_path(uid_or_name, ""))).await
	}

	/// Renames a user.
	pub async fn update_name(&self, uid_or_name: &str, username: &str) -> Result<JsonValue> {
		let form = value::map([("username", username)]);

		self.client.request_json(RequestSpec::post(user_path(uid_or_name, "")).form(form)).await
	}

	/// Changes a user's password.
	pub async fn update_passwd(&self, uid_or_name: &str, passwd: &str) -> Result<JsonValue> {
		let form = value::map([("passwd", passwd)]);

		self.client.request_json(RequestSpec::post(user_path(uid_or_name, "passwd")).form(form)).await
	}

	/// Merges `extra` into the user's extra data; sent as a JSON string form field.
	pub async fn update_extra(&self, uid_or_name: &str, extra: &Map) -> Result<JsonValue> {
		let encoded = serde_json::to_string(extra)
			.map_err(|source| crate::error::ConfigError::JsonBody { source })?;
		let form = value::map([("extra", encoded)]);

		self.client.request_json(RequestSpec::post(user_path(uid_or_name, "extra")).form(form)).await
	}

	/// Checks a password; fails with a remote error when it does not match.
	pub async fn verify_passwd(&self, uid_or_name: &str, passwd: &str) -> Result<JsonValue> {
		let form = value::map([("passwd", passwd)]);

		self.client.request_json(RequestSpec::post(user_path(uid_or_name, "verify")).form(form)).await
	}

	/// Runs a GraphQL query across users.
	pub async fn graphql(&self, query: &str) -> Result<JsonValue> {
		self.client.request_json(graphql_spec("/api/graphql/".into(), query)).await
	}
}

fn user_path(uid_or_name: &str, suffix: &str) -> String {
	format!("/api/users/{uid_or_name}/{suffix}")
}
