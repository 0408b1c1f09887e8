//! Gateway client: request assembly, signing, and JSON unwrapping.
//!
//! [`Client::request`] turns a [`RequestSpec`] into one signed HTTP exchange:
//!
//! 1. URL = host + pathname + compacted query string.
//! 2. When the method is not `GET` (or the config is `secure`) the sign data is built, a
//!    secret is resolved (dynamic fetcher through the [`SecretCache`], else the static secret),
//!    the data is timestamped and compacted, then signed in JSON or param mode.
//! 3. `X-REQUEST-KEY` is always sent; non-`GET` requests default to a form content type that
//!    the payload may override.
//!
//! [`Client::request_json`] layers the envelope and remote-error handling from
//! [`crate::response`] on top.

// crates.io
use http::{HeaderMap, HeaderName, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::{ConfigError, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	request::{FORM_CONTENT_TYPE, RequestSpec},
	response,
	secret::{SecretCache, SecretFetcher, SecretKey},
	transport::{GatewayHttpClient, HttpRequest, RawResponse},
	value::{self, Value},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestHttpClient;

/// Client key header, sent on every request.
pub const X_REQUEST_KEY: HeaderName = HeaderName::from_static("x-request-key");
/// Signature header.
pub const X_REQUEST_SIGNATURE: HeaderName = HeaderName::from_static("x-request-signature");
/// Signing timestamp header (epoch seconds).
pub const X_REQUEST_TIME: HeaderName = HeaderName::from_static("x-request-time");
/// Marks requests signed with a dynamic secret.
pub const X_REQUEST_TYPE: HeaderName = HeaderName::from_static("x-request-type");
/// Nonce of the dynamic secret used to sign the request.
pub const X_REQUEST_NONCE: HeaderName = HeaderName::from_static("x-request-nonce");
/// `X-REQUEST-TYPE` value for dynamically signed requests.
pub const DYNAMIC_REQUEST_TYPE: &str = "JSAPI";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestGatewayClient = Client<ReqwestHttpClient>;

/// Signature material attached to a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSignature {
	/// Uppercase hex HMAC-SHA256.
	pub signature: String,
	/// Epoch seconds that were signed.
	pub timestamp: i64,
	/// Nonce of the dynamic secret, when one was used.
	pub nonce: Option<String>,
}

#[derive(Clone)]
struct DynamicSigning {
	fetcher: Arc<dyn SecretFetcher>,
	cache: Arc<SecretCache>,
}

/// Signed client for one gateway key.
///
/// Cloning is cheap; clones share the transport and, when configured, the secret fetcher and
/// cache.
pub struct Client<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	config: GatewayConfig,
	dynamic: Option<DynamicSigning>,
}
impl<C> Client<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(config: GatewayConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into(), config, dynamic: None }
	}

	/// Signs with secrets issued by `fetcher`, cached in `cache`.
	///
	/// Clients sharing one cache share issued secrets for identical key, method, and pathname.
	pub fn with_secret_fetcher<F>(mut self, fetcher: F, cache: Arc<SecretCache>) -> Self
	where
		F: 'static + SecretFetcher,
	{
		self.dynamic = Some(DynamicSigning { fetcher: Arc::new(fetcher), cache });

		self
	}

	/// Returns a client that signs every request, including `GET`.
	pub fn into_secure(mut self) -> Self {
		self.config = self.config.into_secure();

		self
	}

	/// Returns the client configuration.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Returns the secret cache when dynamic signing is enabled.
	pub fn secret_cache(&self) -> Option<&Arc<SecretCache>> {
		self.dynamic.as_ref().map(|dynamic| &dynamic.cache)
	}

	/// Sends `spec` and returns the buffered response without interpreting it.
	pub async fn request(&self, spec: RequestSpec) -> Result<RawResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, &spec.method, &spec.pathname);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.assemble(&spec).await?;

				self.http_client
					.execute(request)
					.await
					.map_err(|e| Error::from(TransportError::network(e)))
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Sends `spec`, rejects error payloads, and unwraps single-key envelopes.
	pub async fn request_json(&self, spec: RequestSpec) -> Result<JsonValue> {
		self.request_json_with(spec, response::unwrap_envelope).await
	}

	/// Sends `spec`, rejects error payloads, and returns `field` of the response object.
	pub async fn request_json_field(&self, spec: RequestSpec, field: &str) -> Result<JsonValue> {
		self.request_json_with(spec, |value| response::select_field(value, field)).await
	}

	/// Same as [`Client::request_json`], deserializing the unwrapped value into `T`.
	pub async fn request_json_as<T>(&self, spec: RequestSpec) -> Result<T>
	where
		T: DeserializeOwned,
	{
		response::decode(self.request_json(spec).await?)
	}

	async fn request_json_with<F>(&self, spec: RequestSpec, select: F) -> Result<JsonValue>
	where
		F: FnOnce(JsonValue) -> JsonValue,
	{
		const KIND: CallKind = CallKind::RequestJson;

		let span = CallSpan::new(KIND, &spec.method, &spec.pathname);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let raw = self.request(spec).await?;

				response::parse_json(&raw).map(select)
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Builds the outbound request for `spec`, signing it when required.
	pub async fn assemble(&self, spec: &RequestSpec) -> Result<HttpRequest> {
		let mut headers = HeaderMap::new();

		if spec.requires_signature(self.config.secure) {
			let signed = self.sign(spec).await?;

			if let Some(nonce) = &signed.nonce {
				headers.insert(X_REQUEST_TYPE, HeaderValue::from_static(DYNAMIC_REQUEST_TYPE));
				headers.insert(X_REQUEST_NONCE, header_value("X-REQUEST-NONCE", nonce)?);
			}

			headers.insert(X_REQUEST_SIGNATURE, header_value("X-REQUEST-SIGNATURE", &signed.signature)?);
			headers.insert(X_REQUEST_TIME, HeaderValue::from(signed.timestamp));
		}

		headers.insert(X_REQUEST_KEY, header_value("X-REQUEST-KEY", &self.config.key)?);

		if spec.method != Method::GET {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
		}

		let body = match spec.encode_body()? {
			Some(body) => {
				headers.insert(CONTENT_TYPE, header_value("content-type", &body.content_type)?);

				body.bytes
			},
			None => Bytes::new(),
		};
		let mut request = http::Request::builder()
			.method(spec.method.clone())
			.uri(spec.url(&self.config.host)?.as_str())
			.body(body)
			.map_err(ConfigError::from)?;

		*request.headers_mut() = headers;

		Ok(request)
	}

	/// Resolves a secret and signs `spec` at the current time.
	pub async fn sign(&self, spec: &RequestSpec) -> Result<RequestSignature> {
		let mut data = spec.sign_data(&self.config.key);
		let (secret, timestamp, nonce) = match &self.dynamic {
			Some(dynamic) => {
				let key = SecretKey::new(&self.config.key, &spec.method, &spec.pathname);
				let issued = dynamic.cache.get(&key, dynamic.fetcher.as_ref()).await?;

				(issued.secret, issued.timestamp, Some(issued.nonce))
			},
			None => {
				let secret = self.config.secret.clone().ok_or(ConfigError::MissingSecret)?;

				(secret, OffsetDateTime::now_utc().unix_timestamp(), None)
			},
		};

		data.insert("timestamp".into(), Value::from(timestamp));

		let signature = spec.payload.sign_mode().sign(secret.expose().as_bytes(), &value::compact(&data));

		Ok(RequestSignature { signature, timestamp, nonce })
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: GatewayConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Client<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			config: self.config.clone(),
			dynamic: self.dynamic.clone(),
		}
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("host", &self.config.host)
			.field("key", &self.config.key)
			.field("secure", &self.config.secure)
			.field("static_secret_set", &self.config.secret.is_some())
			.field("dynamic_secret", &self.dynamic.is_some())
			.finish()
	}
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
	HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader { name })
}

fn record_result<T>(kind: CallKind, result: &Result<T>) {
	match result {
		Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
		Err(_) => obs::record_call_outcome(kind, CallOutcome::Failure),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{RecordingHttpClient, build_recording_client},
		secret::{DynamicSecret, FnSecretFetcher},
		sign,
		value::map,
	};

	fn config(secure: bool) -> GatewayConfig {
		GatewayConfig::builder("K")
			.host("https://api.test")
			.secret("S")
			.secure(secure)
			.build()
			.expect("Test config should be valid.")
	}

	fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
		request.headers().get(name).and_then(|value| value.to_str().ok())
	}

	#[tokio::test]
	async fn widgets_scenario_signs_form_post() {
		let (client, _) = build_recording_client(config(false), RecordingHttpClient::json("{}"));
		let spec = RequestSpec::post("/api/widgets/").form(map([("name", "foo")]));
		let request = client.assemble(&spec).await.expect("Assembly should succeed.");
		let timestamp: i64 = header(&request, "x-request-time")
			.expect("Signed requests carry X-REQUEST-TIME.")
			.parse()
			.expect("X-REQUEST-TIME is numeric.");
		let expected = sign::sign_param(
			b"S",
			&map([
				("name", Value::from("foo")),
				("pathname", Value::from("/api/widgets/")),
				("key", Value::from("K")),
				("timestamp", Value::from(timestamp)),
			]),
		);

		assert_eq!(request.uri(), "https://api.test/api/widgets/");
		assert_eq!(header(&request, "x-request-key"), Some("K"));
		assert_eq!(header(&request, "x-request-signature"), Some(expected.as_str()));
		assert_eq!(header(&request, "x-request-type"), None);
		assert_eq!(header(&request, "content-type"), Some(FORM_CONTENT_TYPE));
		assert_eq!(request.body(), &Bytes::from_static(b"name=foo"));
	}

	#[tokio::test]
	async fn plain_get_is_unsigned_but_keyed() {
		let (client, _) = build_recording_client(config(false), RecordingHttpClient::json("{}"));
		let spec = RequestSpec::get("/api/users/").query(map([("from", 0), ("size", 10)]));
		let request = client.assemble(&spec).await.expect("Assembly should succeed.");

		assert_eq!(request.uri(), "https://api.test/api/users/?size=10");
		assert_eq!(header(&request, "x-request-key"), Some("K"));
		assert_eq!(header(&request, "x-request-signature"), None);
		assert_eq!(header(&request, "x-request-time"), None);
		assert_eq!(header(&request, "content-type"), None);
		assert!(request.body().is_empty());
	}

	#[tokio::test]
	async fn secure_get_is_signed() {
		let (client, _) = build_recording_client(config(true), RecordingHttpClient::json("{}"));
		let request = client
			.assemble(&RequestSpec::get("/api/coins/a/score/"))
			.await
			.expect("Assembly should succeed.");

		assert!(header(&request, "x-request-signature").is_some());
		assert!(header(&request, "x-request-time").is_some());
	}

	#[tokio::test]
	async fn json_payload_uses_json_signing() {
		let (client, _) = build_recording_client(config(false), RecordingHttpClient::json("{}"));
		let spec = RequestSpec::put("/api/coins/a/info/")
			.json(map([("tags", Value::from(vec![Value::from("x")])), ("note", Value::from(""))]));
		let signed = client.sign(&spec).await.expect("Signing should succeed.");
		let expected = sign::sign_json(
			b"S",
			&map([
				("tags", Value::from(vec![Value::from("x")])),
				("pathname", Value::from("/api/coins/a/info/")),
				("key", Value::from("K")),
				("timestamp", Value::from(signed.timestamp)),
			]),
		);

		assert_eq!(signed.signature, expected);
		assert_eq!(signed.nonce, None);
	}

	#[tokio::test]
	async fn dynamic_secret_sets_jsapi_headers() {
		let fetcher = FnSecretFetcher::new(|_method: Method, _pathname: String| async {
			Ok::<_, std::io::Error>(DynamicSecret::new("nonce-1", "dynamic", 1_700_000_000))
		});
		let cache = Arc::new(SecretCache::new());
		let config = GatewayConfig::builder("K")
			.host("https://api.test")
			.build()
			.expect("Config without a static secret should be valid.");
		let (client, _) = build_recording_client(config, RecordingHttpClient::json("{}"));
		let client = client.with_secret_fetcher(fetcher, cache.clone());
		let request = client
			.assemble(&RequestSpec::delete("/file/a.txt"))
			.await
			.expect("Assembly should succeed.");
		let expected = sign::sign_param(
			b"dynamic",
			&map([
				("pathname", Value::from("/file/a.txt")),
				("key", Value::from("K")),
				("timestamp", Value::from(1_700_000_000)),
			]),
		);

		assert_eq!(header(&request, "x-request-type"), Some("JSAPI"));
		assert_eq!(header(&request, "x-request-nonce"), Some("nonce-1"));
		assert_eq!(header(&request, "x-request-time"), Some("1700000000"));
		assert_eq!(header(&request, "x-request-signature"), Some(expected.as_str()));
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn signing_without_any_secret_fails() {
		let config = GatewayConfig::builder("K").build().expect("Config should be valid.");
		let (client, transport) = build_recording_client(config, RecordingHttpClient::json("{}"));
		let err = client
			.request(RequestSpec::post("/api/users/"))
			.await
			.expect_err("Signing without a secret should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingSecret)));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn request_json_unwraps_through_transport() {
		let (client, transport) =
			build_recording_client(config(false), RecordingHttpClient::json(r#"{"result":"OK"}"#));
		let value = client
			.request_json(RequestSpec::post("/api/coins/a/drop/"))
			.await
			.expect("JSON request should succeed.");

		assert_eq!(value, JsonValue::from("OK"));
		assert_eq!(transport.requests().len(), 1);
	}

	#[test]
	fn debug_output_hides_secret() {
		let (client, _) = build_recording_client(config(false), RecordingHttpClient::json("{}"));
		let rendered = format!("{client:?}");

		assert!(rendered.contains("static_secret_set: true"));
		assert!(!rendered.contains("\"S\""));
	}
}
