//! Caller-facing request description and its translation into transport requests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::{
		HeaderMap, HeaderName, HeaderValue, HttpRequest, Method,
		header::{AUTHORIZATION, CONTENT_TYPE},
	},
};

/// Method, endpoint, headers, and body of one API call.
///
/// [`AuthClient::send`](crate::client::AuthClient::send) borrows the request so it can re-send it
/// once after a token refresh.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Endpoint relative to the configured base URL, or an absolute URL.
	pub endpoint: String,
	/// Caller header overrides. `Authorization` is owned by the client and rejected.
	pub headers: HeaderMap,
	/// Serialized request body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self { method, endpoint: endpoint.into(), headers: HeaderMap::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::GET, endpoint)
	}

	/// Shorthand for a `POST` request.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::POST, endpoint)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(endpoint: impl Into<String>) -> Self {
		Self::new(Method::PUT, endpoint)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(endpoint: impl Into<String>) -> Self {
		Self::new(Method::PATCH, endpoint)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(endpoint: impl Into<String>) -> Self {
		Self::new(Method::DELETE, endpoint)
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(ConfigError::BodyEncode)?);

		Ok(self)
	}

	/// Uses `bytes` verbatim as the payload.
	pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
		self.body = Some(bytes.into());

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Adds a header value, keeping any values already set under `name`.
	pub fn append_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);

		self
	}

	pub(crate) fn ensure_authorization_unset(&self) -> Result<(), ConfigError> {
		if self.headers.contains_key(AUTHORIZATION) {
			Err(ConfigError::AuthorizationOverride)
		} else {
			Ok(())
		}
	}

	/// Builds the transport request for `url`.
	///
	/// Header precedence, lowest first: configured defaults, the JSON content type, caller
	/// headers, then the bearer token. A caller header replaces every default value of the same
	/// name and keeps all of its own values.
	pub(crate) fn prepare(
		&self,
		url: &Url,
		defaults: &HeaderMap,
		access_token: Option<&TokenSecret>,
	) -> Result<HttpRequest, ConfigError> {
		let mut headers = defaults.clone();

		if !headers.contains_key(CONTENT_TYPE) && !self.headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, application_json());
		}

		for name in self.headers.keys() {
			headers.remove(name);
		}
		for (name, value) in self.headers.iter() {
			headers.append(name.clone(), value.clone());
		}

		if let Some(token) = access_token {
			headers.insert(AUTHORIZATION, bearer_header(token)?);
		}

		let mut request = ::http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone().unwrap_or_default())?;

		*request.headers_mut() = headers;

		Ok(request)
	}
}

/// Builds the JSON `POST` sent to the refresh endpoint.
pub(crate) fn refresh_request(url: &Url, body: Vec<u8>) -> Result<HttpRequest, ConfigError> {
	let mut request =
		::http::Request::builder().method(Method::POST).uri(url.as_str()).body(body)?;

	request.headers_mut().insert(CONTENT_TYPE, application_json());

	Ok(request)
}

fn application_json() -> HeaderValue {
	HeaderValue::from_static("application/json")
}

fn bearer_header(token: &TokenSecret) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(&token.bearer())
		.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

	value.set_sensitive(true);

	Ok(value)
}
