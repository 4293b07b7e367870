// self
use crate::{
	_prelude::*,
	config::{ClientConfig, RefreshPolicy, join_base},
	error::ConfigError,
	http::{HeaderMap, HeaderName, HeaderValue, header::AUTHORIZATION},
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL that relative endpoints are appended to.
	pub base_url: Url,
	/// Refresh endpoint path appended to the base URL.
	pub refresh_path: String,
	/// Absolute refresh endpoint; takes precedence over `refresh_path`.
	pub refresh_endpoint: Option<Url>,
	/// Headers attached to every API request.
	pub default_headers: HeaderMap,
	/// Refresh failure policy.
	pub refresh_policy: RefreshPolicy,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.to_owned(),
			refresh_endpoint: None,
			default_headers: HeaderMap::new(),
			refresh_policy: RefreshPolicy::default(),
		}
	}

	/// Overrides the refresh endpoint path (defaults to `/api/auth/refresh`).
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Points refreshes at an absolute URL, e.g. a dedicated auth host.
	pub fn refresh_endpoint(mut self, url: Url) -> Self {
		self.refresh_endpoint = Some(url);

		self
	}

	/// Adds a header sent with every API request.
	pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.default_headers.insert(name, value);

		self
	}

	/// Overrides the refresh failure policy.
	pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
		self.refresh_policy = policy;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		validate_base_url(&self.base_url)?;

		if self.default_headers.contains_key(AUTHORIZATION) {
			return Err(ConfigError::AuthorizationOverride);
		}

		let refresh_endpoint = match self.refresh_endpoint {
			Some(url) => {
				validate_base_url(&url)?;

				url
			},
			None => join_base(&self.base_url, &self.refresh_path)?,
		};

		Ok(ClientConfig {
			base_url: self.base_url,
			refresh_endpoint,
			default_headers: self.default_headers,
			refresh_policy: self.refresh_policy,
		})
	}
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { url: url.to_string() });
	}

	Ok(())
}
