//! Transport primitives used by the client.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack: it receives a fully
//! prepared [`HttpRequest`] (method, absolute URL, headers, body) and returns the raw
//! [`HttpResponse`]. Status handling, credential attachment, and refresh coordination all live
//! above this seam, so a transport never needs to know about 401s or tokens.

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};

// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::{_prelude::*, error::TransportError};

/// Fully prepared outbound request.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Raw response returned by a transport.
pub type HttpResponse = ::http::Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one request.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by every
/// clone of a client, and the returned future must be `Send` so callers can drive requests from
/// any executor. A transport reports every HTTP status as `Ok`; only failures that prevent a
/// response from arriving map to [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and resolves with the complete response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds the wrapped client from a configured reqwest builder (timeouts, proxies, TLS).
	pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, ConfigError> {
		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl std::ops::Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let url = request.uri().to_string();
			let network = |e: ReqwestError| TransportError::network(url.as_str(), e);
			let request = reqwest::Request::try_from(request).map_err(network)?;
			let response = client.execute(request).await.map_err(network)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(network)?;
			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct Teapot;
	impl HttpTransport for Teapot {
		fn execute(&self, _request: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				let mut response = HttpResponse::new(b"short and stout".to_vec());

				*response.status_mut() = StatusCode::IM_A_TEAPOT;

				Ok(response)
			})
		}
	}

	#[tokio::test]
	async fn trait_objects_execute_requests() {
		let transport: Arc<dyn HttpTransport> = Arc::new(Teapot);
		let request = ::http::Request::builder()
			.uri("http://localhost/brew")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let response = transport.execute(request).await.expect("Teapot transport never fails.");

		assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
		assert_eq!(response.body().as_slice(), b"short and stout");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_transport_builds_from_a_configured_builder() {
		let builder = ReqwestClient::builder().timeout(std::time::Duration::from_secs(5));

		ReqwestTransport::from_builder(builder).expect("Configured reqwest client should build.");
	}
}
