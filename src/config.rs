//! Client configuration: API base URL, refresh endpoint, default headers, and refresh policy.
//!
//! [`ClientConfig`] values are only produced by [`ClientConfigBuilder::build`] (or the
//! [`ClientConfig::from_env`] shortcut), so every instance carries a validated base URL and a
//! resolved refresh endpoint.

/// Builder API for assembling client configuration.
pub mod builder;
/// Refresh retry policy.
pub mod policy;

pub use builder::*;
pub use policy::*;

// self
use crate::{_prelude::*, error::ConfigError, http::HeaderMap};

/// Validated configuration consumed by [`AuthClient`](crate::client::AuthClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base URL that relative endpoints are appended to.
	pub base_url: Url,
	/// Absolute URL of the token refresh endpoint.
	pub refresh_endpoint: Url,
	/// Headers attached to every API request before caller overrides.
	pub default_headers: HeaderMap,
	/// Policy applied when the refresh call itself fails.
	pub refresh_policy: RefreshPolicy,
}
impl ClientConfig {
	/// Environment variable consulted by [`ClientConfig::from_env`].
	pub const BASE_URL_ENV: &'static str = "PUBLIC_API_URL";
	/// Base URL used when the environment does not provide one.
	pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";
	/// Path of the refresh endpoint relative to the base URL.
	pub const DEFAULT_REFRESH_PATH: &'static str = "/api/auth/refresh";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Parses `base_url` and builds a configuration with defaults for everything else.
	pub fn from_base_url(base_url: &str) -> Result<Self, ConfigError> {
		let base_url =
			Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Self::builder(base_url).build()
	}

	/// Reads the base URL from `PUBLIC_API_URL`, falling back to `http://localhost:8000`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let value = std::env::var(Self::BASE_URL_ENV).ok();

		Self::from_base_url(Self::base_url_or_default(value.as_deref()))
	}

	/// Resolves a caller-supplied endpoint into the absolute URL to call.
	///
	/// Absolute `http`/`https` URLs are used unchanged. Anything else is appended to the base
	/// URL with exactly one `/` between them, so a base such as `https://host/v1` keeps its
	/// `/v1` prefix.
	pub fn resolve(&self, endpoint: &str) -> Result<Url, ConfigError> {
		match Url::parse(endpoint) {
			Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
			_ => join_base(&self.base_url, endpoint),
		}
	}

	fn base_url_or_default(value: Option<&str>) -> &str {
		value.map(str::trim).filter(|value| !value.is_empty()).unwrap_or(Self::DEFAULT_BASE_URL)
	}
}

pub(crate) fn join_base(base_url: &Url, endpoint: &str) -> Result<Url, ConfigError> {
	let base = base_url.as_str().trim_end_matches('/');
	let joined = if endpoint.is_empty() {
		base.to_owned()
	} else {
		format!("{base}/{}", endpoint.trim_start_matches('/'))
	};

	Url::parse(&joined)
		.map_err(|source| ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source })
}
