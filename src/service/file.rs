//! Raw file storage under `/file/{name}`.

// self
use crate::{
	_prelude::*,
	client::Client,
	request::RequestSpec,
	transport::{GatewayHttpClient, RawResponse},
};

/// File storage service; responses are returned unparsed.
#[derive(Clone, Debug)]
pub struct FileService<C>
where
	C: ?Sized + GatewayHttpClient,
{
	client: Client<C>,
}
impl<C> FileService<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Wraps `client`.
	pub fn new(client: Client<C>) -> Self {
		Self { client }
	}

	/// Returns the underlying client.
	pub fn client(&self) -> &Client<C> {
		&self.client
	}

	/// Uploads `data` as `name`.
	pub async fn put(&self, name: &str, data: impl Into<Bytes>) -> Result<RawResponse> {
		self.client.request(RequestSpec::put(path(name)).raw(data)).await
	}

	/// Uploads `data` as `name` with an explicit content type.
	pub async fn put_typed(
		&self,
		name: &str,
		data: impl Into<Bytes>,
		content_type: &str,
	) -> Result<RawResponse> {
		self.client.request(RequestSpec::put(path(name)).raw_with_type(data, content_type)).await
	}

	/// Downloads `name`.
	pub async fn get(&self, name: &str) -> Result<RawResponse> {
		self.client.request(RequestSpec::get(path(name))).await
	}

	/// Deletes `name`.
	pub async fn remove(&self, name: &str) -> Result<RawResponse> {
		self.client.request(RequestSpec::delete(path(name))).await
	}
}

fn path(name: &str) -> String {
	format!("/file/{name}")
}
