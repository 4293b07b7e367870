//! Client-level error types shared across the request path, refresh flow, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by [`AuthClient`](crate::client::AuthClient) operations.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure on the request path.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure before any response arrived (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The API rejected the access token and no refresh token is stored.
	#[error("Authentication is required; no refresh token is stored.")]
	AuthRequired,
	/// The session could not be renewed and stored credentials were cleared.
	#[error("Session expired: {reason}.")]
	SessionExpired {
		/// Why the session ended.
		reason: RefreshFailure,
	},
	/// Final response carried a non-success status.
	#[error("Request failed with HTTP status {status}.")]
	Http {
		/// HTTP status code of the final response.
		status: u16,
		/// Parsed error body, or an empty object when the body is not JSON.
		body: serde_json::Value,
	},
	/// Successful response body could not be decoded into the requested type.
	#[error("Response body with HTTP status {status} could not be decoded.")]
	Decode {
		/// HTTP status code of the response.
		status: u16,
		/// Structured decoding failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status attached to the error, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` for failures that ended the session (`AuthRequired`, `SessionExpired`).
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::AuthRequired | Self::SessionExpired { .. })
	}
}
impl From<RefreshFailure> for Error {
	fn from(reason: RefreshFailure) -> Self {
		match reason {
			RefreshFailure::MissingRefreshToken => Self::AuthRequired,
			reason => Self::SessionExpired { reason },
		}
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
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a path (e.g. `mailto:`).
	#[error("Base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Endpoint does not resolve to a valid URL.
	#[error("Endpoint `{endpoint}` does not resolve to a valid URL.")]
	InvalidEndpoint {
		/// Endpoint string supplied by the caller.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Caller tried to set the `Authorization` header, which the client owns.
	#[error("The Authorization header is managed by the client and cannot be overridden.")]
	AuthorizationOverride,
	/// A header value could not be encoded.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: String,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be encoded as JSON.")]
	BodyEncode(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed call.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error for the provided URL.
	pub fn network(
		url: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

/// Reasons a token refresh could not renew the session.
///
/// Values are cloned to every caller that joined the same refresh, so the type only carries
/// owned, displayable data.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshFailure {
	/// No refresh token was stored; the refresh endpoint was never called.
	#[error("no refresh token is stored")]
	MissingRefreshToken,
	/// Refresh request could not be constructed locally.
	#[error("refresh request could not be built: {message}")]
	Request {
		/// Rendered construction error.
		message: String,
	},
	/// Transport failure while calling the refresh endpoint.
	#[error("refresh endpoint unreachable: {message}")]
	Network {
		/// Rendered transport error.
		message: String,
	},
	/// Refresh endpoint answered with a non-success status.
	#[error("refresh endpoint rejected the token with HTTP status {status}")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// Refresh endpoint returned a body that is not the expected JSON shape.
	#[error("refresh endpoint returned malformed JSON: {message}")]
	MalformedResponse {
		/// Rendered parsing error including the JSON path.
		message: String,
	},
	/// Refresh endpoint succeeded but omitted the new access token.
	#[error("refresh response did not include an access token")]
	MissingAccessToken,
	/// Credential store failed while reading or persisting tokens during refresh.
	#[error("credential store failed during refresh: {message}")]
	Storage {
		/// Rendered store error.
		message: String,
	},
	/// The request retried with a freshly issued token was still rejected with 401.
	#[error("retried request was rejected with a renewed token")]
	RetryRejected,
}
impl RefreshFailure {
	/// Returns `true` when the failure came from the transport and may succeed on another attempt.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Network { .. })
	}
}
