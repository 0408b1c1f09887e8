//! Gateway-level error types shared across signing, transport, and response handling.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error accepted from caller-supplied collaborators such as secret fetchers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Dynamic secret collaborator failed; the original failure is kept as the source.
	#[error("Dynamic secret fetch failed.")]
	SecretFetch {
		/// Failure reported by the secret fetcher.
		#[source]
		source: BoxError,
	},
	/// Gateway answered with an error payload or a non-JSON body.
	#[error("Remote error: {message}")]
	Remote {
		/// Value of the `err`/`error`/`errors` field, or the raw response text.
		message: String,
		/// HTTP status code of the response.
		status: Option<u16>,
	},
	/// Response JSON could not be parsed or mapped onto the requested type.
	#[error("Gateway returned JSON that could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Wraps a secret fetcher failure.
	pub fn secret_fetch(src: impl Into<BoxError>) -> Self {
		Self::SecretFetch { source: src.into() }
	}

	/// Returns the remote message when this is an [`Error::Remote`].
	pub fn remote_message(&self) -> Option<&str> {
		match self {
			Self::Remote { message, .. } => Some(message),
			_ => None,
		}
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for Error {
	fn from(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Decode { source }
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed (bad URI, method, or header).
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Gateway host cannot be parsed as a URL.
	#[error("Gateway host `{host}` is not a valid URL.")]
	InvalidHost {
		/// Host string that failed validation.
		host: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Host and pathname do not combine into a valid URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Concatenated host and pathname.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Gateway host uses a scheme other than HTTP(S).
	#[error("Gateway host must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Scheme found on the host URL.
		scheme: String,
	},
	/// Request method is not a valid HTTP token.
	#[error("Request method `{method}` is invalid.")]
	InvalidMethod {
		/// Method string supplied by the caller.
		method: String,
	},
	/// Request must be signed but neither a static secret nor a secret fetcher is configured.
	#[error("Signing requires a static secret or a dynamic secret fetcher.")]
	MissingSecret,
	/// Header value contains characters HTTP does not allow.
	#[error("Header `{name}` contains an invalid value.")]
	InvalidHeader {
		/// Header name being populated.
		name: &'static str,
	},
	/// JSON payload could not be serialized.
	#[error("JSON payload could not be serialized.")]
	JsonBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the gateway.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
