//! Request descriptions consumed by [`crate::client::Client`].
//!
//! A [`RequestSpec`] pairs a method and pathname with an optional query map and exactly one
//! [`Payload`]. The payload decides both the body encoding and the signing mode, so callers
//! can no longer supply conflicting `form`/`json`/`raw` bodies.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	sign::SignMode,
	value::{self, Map, Value},
};

/// Content type used for form bodies and as the default for non-`GET` requests.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
/// Content type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type used for raw bodies without an explicit type.
pub const RAW_CONTENT_TYPE: &str = "application/x-raw-data";

/// Request body, at most one per request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
	/// No body.
	#[default]
	None,
	/// URL-encoded form body; falsy fields are dropped.
	Form(Map),
	/// JSON object body; falsy top-level fields are dropped and the request is JSON-signed.
	Json(Map),
	/// Binary body sent unmodified.
	Raw {
		/// Body bytes.
		data: Bytes,
		/// Content type; defaults to [`RAW_CONTENT_TYPE`].
		content_type: Option<String>,
	},
}
impl Payload {
	/// Signing mode implied by this payload.
	pub fn sign_mode(&self) -> SignMode {
		match self {
			Self::Json(_) => SignMode::Json,
			_ => SignMode::Param,
		}
	}

	/// Returns a stable label suitable for span or log fields.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Form(_) => "form",
			Self::Json(_) => "json",
			Self::Raw { .. } => "raw",
		}
	}
}

/// Encoded request body with its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBody {
	/// Value of the `content-type` header.
	pub content_type: String,
	/// Body bytes.
	pub bytes: Bytes,
}

/// Description of one gateway call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
	/// Uppercase request method.
	pub method: Method,
	/// Path appended to the gateway host.
	pub pathname: String,
	/// Query parameters; signed alongside form and JSON payloads.
	pub query: Option<Map>,
	/// Request body.
	pub payload: Payload,
}
impl RequestSpec {
	/// Creates a spec, normalizing `method` to uppercase; an empty method means `GET`.
	pub fn new(method: impl AsRef<str>, pathname: impl Into<String>) -> Result<Self, ConfigError> {
		let raw = method.as_ref().trim();
		let method = if raw.is_empty() {
			Method::GET
		} else {
			Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
				.map_err(|_| ConfigError::InvalidMethod { method: raw.into() })?
		};

		Ok(Self::with_method(method, pathname))
	}

	/// Creates a spec for an already parsed method.
	pub fn with_method(method: Method, pathname: impl Into<String>) -> Self {
		let method = match Method::from_bytes(method.as_str().to_ascii_uppercase().as_bytes()) {
			Ok(upper) => upper,
			Err(_) => method,
		};

		Self { method, pathname: pathname.into(), query: None, payload: Payload::None }
	}

	/// `GET` spec.
	pub fn get(pathname: impl Into<String>) -> Self {
		Self::with_method(Method::GET, pathname)
	}

	/// `POST` spec.
	pub fn post(pathname: impl Into<String>) -> Self {
		Self::with_method(Method::POST, pathname)
	}

	/// `PUT` spec.
	pub fn put(pathname: impl Into<String>) -> Self {
		Self::with_method(Method::PUT, pathname)
	}

	/// `DELETE` spec.
	pub fn delete(pathname: impl Into<String>) -> Self {
		Self::with_method(Method::DELETE, pathname)
	}

	/// Sets the query map.
	pub fn query(mut self, query: Map) -> Self {
		self.query = Some(query);

		self
	}

	/// Replaces the payload with a form body.
	pub fn form(mut self, form: Map) -> Self {
		self.payload = Payload::Form(form);

		self
	}

	/// Replaces the payload with a JSON body.
	pub fn json(mut self, json: Map) -> Self {
		self.payload = Payload::Json(json);

		self
	}

	/// Replaces the payload with a raw body using [`RAW_CONTENT_TYPE`].
	pub fn raw(mut self, data: impl Into<Bytes>) -> Self {
		self.payload = Payload::Raw { data: data.into(), content_type: None };

		self
	}

	/// Replaces the payload with a raw body of the given content type.
	pub fn raw_with_type(mut self, data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
		self.payload = Payload::Raw { data: data.into(), content_type: Some(content_type.into()) };

		self
	}

	/// Whether this request must carry a signature.
	pub fn requires_signature(&self, secure: bool) -> bool {
		self.method != Method::GET || secure
	}

	/// Builds `host + pathname`, appending the compacted, URL-encoded query when non-empty.
	///
	/// Characters a URI path cannot carry (spaces, quotes, non-ASCII) are percent-encoded; the
	/// signature still covers the pathname exactly as given.
	pub fn url(&self, host: &str) -> Result<Url, ConfigError> {
		let raw = format!("{host}{}", self.pathname);
		let mut url =
			Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw.clone(), source })?;
		let encoded = self.query.as_ref().map(value::encode_form).unwrap_or_default();

		url.set_query((!encoded.is_empty()).then_some(encoded.as_str()));

		Ok(url)
	}

	/// Sign data before timestamping and compaction.
	///
	/// Raw payloads sign only `{raw, pathname, key}`; otherwise query and form/JSON fields are
	/// merged (payload fields win on collision) before `pathname` and `key` are added.
	pub fn sign_data(&self, key: &str) -> Map {
		let mut data = Map::new();

		match &self.payload {
			Payload::Raw { data: raw, .. } => {
				data.insert("raw".into(), Value::Bytes(raw.clone()));
			},
			payload => {
				if let Some(query) = &self.query {
					data.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
				}
				if let Payload::Form(fields) | Payload::Json(fields) = payload {
					data.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
				}
			},
		}

		data.insert("pathname".into(), Value::from(&self.pathname));
		data.insert("key".into(), Value::from(key));

		data
	}

	/// Encodes the body, if the payload carries one.
	pub fn encode_body(&self) -> Result<Option<EncodedBody>, ConfigError> {
		let body = match &self.payload {
			Payload::None => return Ok(None),
			Payload::Form(form) => EncodedBody {
				content_type: FORM_CONTENT_TYPE.into(),
				bytes: value::encode_form(form).into(),
			},
			Payload::Json(json) => EncodedBody {
				content_type: JSON_CONTENT_TYPE.into(),
				bytes: serde_json::to_vec(&value::compact(json))
					.map_err(|source| ConfigError::JsonBody { source })?
					.into(),
			},
			Payload::Raw { data, content_type } => EncodedBody {
				content_type: content_type.clone().unwrap_or_else(|| RAW_CONTENT_TYPE.into()),
				bytes: data.clone(),
			},
		};

		Ok(Some(body))
	}
}
impl Default for RequestSpec {
	fn default() -> Self {
		Self::get("")
	}
}
