//! Gateway connection settings.

// self
use crate::{_prelude::*, error::ConfigError, secret::SecretString};

/// Immutable settings for one gateway client.
///
/// The static secret is never serialized; deserialized configs should pass through
/// [`GatewayConfig::validated`] before use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Gateway base URL, without a trailing slash; pathnames are appended verbatim.
	#[serde(default = "default_host")]
	pub host: String,
	/// Client key sent as `X-REQUEST-KEY` and mixed into every signature.
	pub key: String,
	/// Static signing secret, used when no dynamic secret fetcher is attached.
	#[serde(default, skip_serializing)]
	pub secret: Option<SecretString>,
	/// Signs `GET` requests too when set.
	#[serde(default)]
	pub secure: bool,
}
impl GatewayConfig {
	/// Host used when none is configured.
	pub const DEFAULT_HOST: &'static str = "https://gw.huabot.com";

	/// Creates a builder for the provided client key.
	pub fn builder(key: impl Into<String>) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(key)
	}

	/// Validates the host and normalizes its trailing slash.
	pub fn validated(mut self) -> Result<Self, ConfigError> {
		let url = Url::parse(&self.host)
			.map_err(|source| ConfigError::InvalidHost { host: self.host.clone(), source })?;

		if !matches!(url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: url.scheme().into() });
		}

		let trimmed = self.host.trim_end_matches('/').len();

		self.host.truncate(trimmed);

		Ok(self)
	}

	/// Returns a copy that signs every request, including `GET`.
	pub fn into_secure(mut self) -> Self {
		self.secure = true;

		self
	}
}

fn default_host() -> String {
	GatewayConfig::DEFAULT_HOST.into()
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Gateway base URL.
	pub host: String,
	/// Client key.
	pub key: String,
	/// Optional static secret.
	pub secret: Option<SecretString>,
	/// Whether `GET` requests are signed.
	pub secure: bool,
}
impl GatewayConfigBuilder {
	/// Creates a builder with [`GatewayConfig::DEFAULT_HOST`].
	pub fn new(key: impl Into<String>) -> Self {
		Self { host: default_host(), key: key.into(), secret: None, secure: false }
	}

	/// Overrides the gateway host.
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = host.into();

		self
	}

	/// Sets the static signing secret.
	pub fn secret(mut self, secret: impl Into<SecretString>) -> Self {
		self.secret = Some(secret.into());

		self
	}

	/// Controls whether `GET` requests are signed.
	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = secure;

		self
	}

	/// Validates and returns the config.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		GatewayConfig { host: self.host, key: self.key, secret: self.secret, secure: self.secure }
			.validated()
	}
}
