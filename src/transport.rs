//! Transport primitives for gateway calls.
//!
//! The client depends on an HTTP stack only through [`GatewayHttpClient`]: it hands over a fully
//! assembled [`HttpRequest`] and receives a buffered [`RawResponse`]. The default
//! [`ReqwestHttpClient`] lives behind the `reqwest` feature; tests and embedders can plug in
//! any other implementation.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Fully assembled outbound request.
pub type HttpRequest = http::Request<Bytes>;
/// Buffered response handed back to callers without interpretation.
pub type RawResponse = http::Response<Bytes>;
/// Boxed future returned by [`GatewayHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<RawResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing signed gateway requests.
///
/// Implementations issue exactly one HTTP exchange per call and must not retry; failures are
/// surfaced to the caller unchanged as [`crate::error::TransportError`].
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and buffers the response body.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds the wrapped client from a configured reqwest builder.
	pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, ConfigError> {
		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestClient> for ReqwestHttpClient {
	fn from(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(reqwest::Request::try_from(request)?).await?;
			let status = response.status();
			let version = response.version();
			let headers = response.headers().to_owned();
			let mut raw = RawResponse::new(response.bytes().await?);

			*raw.status_mut() = status;
			*raw.version_mut() = version;
			*raw.headers_mut() = headers;

			Ok(raw)
		})
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
