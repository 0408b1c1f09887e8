//! Signed HTTP client for the Yuntan gateway: canonical HMAC request signing, cached dynamic
//! secrets, and envelope-aware JSON responses shared by every gateway-backed service.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod error;
pub mod obs;
pub mod request;
pub mod response;
pub mod secret;
pub mod service;
pub mod sign;
pub mod transport;
pub mod value;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::convert::Infallible;
	// crates.io
	use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
	// self
	use crate::{
		client::Client,
		config::GatewayConfig,
		transport::{GatewayHttpClient, HttpFuture, HttpRequest, RawResponse},
	};

	/// Request captured by [`RecordingHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// Uppercase request method.
		pub method: Method,
		/// Full request URI.
		pub uri: String,
		/// Headers attached by the client.
		pub headers: HeaderMap,
		/// Request body bytes.
		pub body: Bytes,
	}
	impl RecordedRequest {
		/// Returns a header as a string slice, if present and valid UTF-8.
		pub fn header(&self, name: &str) -> Option<&str> {
			self.headers.get(name).and_then(|value| value.to_str().ok())
		}
	}

	/// In-memory transport that records each request and replays a canned response.
	#[derive(Clone, Debug)]
	pub struct RecordingHttpClient {
		requests: Arc<Mutex<Vec<RecordedRequest>>>,
		status: StatusCode,
		content_type: &'static str,
		body: Bytes,
	}
	impl RecordingHttpClient {
		/// Replays `200 OK` with a JSON body.
		pub fn json(body: &str) -> Self {
			Self::new(StatusCode::OK, "application/json", body)
		}

		/// Replays the provided status with a plain-text body.
		pub fn text(status: u16, body: &str) -> Self {
			let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

			Self::new(status, "text/plain; charset=utf-8", body)
		}

		fn new(status: StatusCode, content_type: &'static str, body: &str) -> Self {
			Self {
				requests: Default::default(),
				status,
				content_type,
				body: Bytes::copy_from_slice(body.as_bytes()),
			}
		}

		/// Returns every request recorded so far.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}

		/// Returns the most recent request, if any.
		pub fn last_request(&self) -> Option<RecordedRequest> {
			self.requests.lock().last().cloned()
		}
	}
	impl GatewayHttpClient for RecordingHttpClient {
		type TransportError = Infallible;

		fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
			let (parts, body) = request.into_parts();

			self.requests.lock().push(RecordedRequest {
				method: parts.method,
				uri: parts.uri.to_string(),
				headers: parts.headers,
				body,
			});

			let mut response = RawResponse::new(self.body.clone());

			*response.status_mut() = self.status;
			response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));

			Box::pin(async move { Ok(response) })
		}
	}

	/// Builds a client over a [`RecordingHttpClient`], returning both so tests can inspect
	/// captured requests.
	pub fn build_recording_client(
		config: GatewayConfig,
		transport: RecordingHttpClient,
	) -> (Client<RecordingHttpClient>, RecordingHttpClient) {
		let client = Client::with_http_client(config, transport.clone());

		(client, transport)
	}

	/// Builds a reqwest-backed client pointed at `host`.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(
		host: &str,
		key: &str,
		secret: &str,
	) -> crate::client::ReqwestGatewayClient {
		let config = GatewayConfig::builder(key)
			.host(host)
			.secret(secret)
			.build()
			.expect("Test gateway configuration should be valid.");

		Client::new(config)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use bytes::Bytes;
	pub use http::{HeaderValue, Method};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(feature = "reqwest")] pub use reqwest;
#[cfg(test)] use {color_eyre as _, httpmock as _};
