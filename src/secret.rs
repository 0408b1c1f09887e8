//! Signing secrets: the redacted [`SecretString`] wrapper, dynamically issued
//! [`DynamicSecret`]s, and the [`SecretFetcher`] contract used to obtain them.

pub mod cache;

pub use cache::*;

// self
use crate::{_prelude::*, error::BoxError};

/// Boxed future returned by [`SecretFetcher::fetch`].
pub type SecretFuture<'a> = Pin<Box<dyn Future<Output = Result<DynamicSecret, BoxError>> + 'a + Send>>;

/// Redacted secret wrapper keeping signing material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);
impl SecretString {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretString").field(&"<redacted>").finish()
	}
}
impl Display for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Short-lived, per-path secret issued by the secret collaborator.
///
/// Issuers commonly send `timestamp` as either a number or a numeric string; both forms
/// deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSecret {
	/// Nonce echoed back to the gateway in `X-REQUEST-NONCE`.
	pub nonce: String,
	/// HMAC key for requests signed with this secret; never serialized.
	#[serde(skip_serializing)]
	pub secret: SecretString,
	/// Issue time in epoch seconds; signed as `timestamp` and sent in `X-REQUEST-TIME`.
	#[serde(deserialize_with = "deserialize_timestamp")]
	pub timestamp: i64,
}
impl DynamicSecret {
	/// Creates a new dynamic secret.
	pub fn new(nonce: impl Into<String>, secret: impl Into<SecretString>, timestamp: i64) -> Self {
		Self { nonce: nonce.into(), secret: secret.into(), timestamp }
	}
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Timestamp {
		Int(i64),
		Float(f64),
		Text(String),
	}

	match Timestamp::deserialize(deserializer)? {
		Timestamp::Int(v) => Ok(v),
		Timestamp::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
		Timestamp::Float(v) => Err(serde::de::Error::custom(format!("invalid timestamp {v}"))),
		Timestamp::Text(s) => s
			.trim()
			.parse::<i64>()
			.map_err(|_| serde::de::Error::custom(format!("invalid timestamp `{s}`"))),
	}
}

/// Caller-supplied collaborator that issues a [`DynamicSecret`] for a method + pathname.
///
/// Failures are surfaced to the request that triggered the fetch as
/// [`Error::SecretFetch`]; the gateway client never retries.
pub trait SecretFetcher
where
	Self: Send + Sync,
{
	/// Fetches a fresh secret for the uppercase `method` and `pathname`.
	fn fetch<'a>(&'a self, method: &'a Method, pathname: &'a str) -> SecretFuture<'a>;
}
impl<F> SecretFetcher for Arc<F>
where
	F: ?Sized + SecretFetcher,
{
	fn fetch<'a>(&'a self, method: &'a Method, pathname: &'a str) -> SecretFuture<'a> {
		<F as SecretFetcher>::fetch(self.as_ref(), method, pathname)
	}
}

/// Adapts an async closure into a [`SecretFetcher`].
#[derive(Clone)]
pub struct FnSecretFetcher<F>(F);
impl<F> FnSecretFetcher<F> {
	/// Wraps `f`, which receives the uppercase method and the pathname.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F> Debug for FnSecretFetcher<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnSecretFetcher(..)")
	}
}
impl<F, Fut, E> SecretFetcher for FnSecretFetcher<F>
where
	F: Send + Sync + Fn(Method, String) -> Fut,
	Fut: 'static + Send + Future<Output = Result<DynamicSecret, E>>,
	E: 'static + Into<BoxError>,
{
	fn fetch<'a>(&'a self, method: &'a Method, pathname: &'a str) -> SecretFuture<'a> {
		let fut = (self.0)(method.clone(), pathname.to_owned());

		Box::pin(async move { fut.await.map_err(Into::into) })
	}
}
