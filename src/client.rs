//! The authenticated request client.
//!
//! [`AuthClient`] attaches the stored access token to every call, detects 401 responses, funnels
//! them into a single in-flight refresh, and retries each affected request exactly once with the
//! renewed token. When the session cannot be recovered the credential store is cleared and the
//! configured [`LogoutHook`] runs once.

pub mod hook;
pub mod refresh;

pub use hook::LogoutHook;
pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKey, TokenSecret},
	client::refresh::coordinator::{Expiry, RefreshCoordinator},
	config::ClientConfig,
	error::{ConfigError, RefreshFailure},
	http::{HttpResponse, HttpTransport, StatusCode},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::ApiRequest,
	store::{self, CredentialStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestAuthClient = AuthClient<ReqwestTransport>;

/// Authenticated request layer over an [`HttpTransport`] and a [`CredentialStore`].
///
/// Clones share the transport, store, refresh coordinator, and counters, so concurrent requests
/// issued through any clone still trigger at most one refresh.
pub struct AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Transport used for API and refresh calls.
	pub transport: Arc<C>,
	/// Store holding the session credential.
	pub store: Arc<dyn CredentialStore>,
	/// Base URL, refresh endpoint, default headers, and refresh policy.
	pub config: Arc<ClientConfig>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	logout_hook: Arc<dyn LogoutHook>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<C> AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn CredentialStore>,
		config: ClientConfig,
		transport: impl Into<Arc<C>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config: Arc::new(config),
			refresh_metrics: Default::default(),
			logout_hook: Arc::new(hook::noop),
			coordinator: Default::default(),
		}
	}

	/// Sets the side effect run when a session ends.
	pub fn with_logout_hook<H>(mut self, hook: H) -> Self
	where
		H: 'static + LogoutHook,
	{
		self.logout_hook = Arc::new(hook);

		self
	}

	/// Sends `request` and decodes the JSON body of a successful response into `R`.
	///
	/// An empty success body decodes as JSON `null`, so `()` and `Option<_>` suit 204 responses.
	/// Non-success statuses surface as [`Error::Http`] carrying the parsed error body, or `{}`
	/// when the body is not JSON.
	pub async fn execute<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		decode_response(self.send(request).await?)
	}

	/// Sends `request` with refresh-and-retry handling and returns the final raw response.
	///
	/// Every status other than a 401 that could not be recovered is returned as `Ok`.
	pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch(&request)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// `GET` shorthand for [`execute`](Self::execute).
	pub async fn get<R>(&self, endpoint: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::get(endpoint)).await
	}

	/// `POST` shorthand for [`execute`](Self::execute) with a JSON body.
	pub async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::post(endpoint).json(body)?).await
	}

	/// `PUT` shorthand for [`execute`](Self::execute) with a JSON body.
	pub async fn put<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::put(endpoint).json(body)?).await
	}

	/// `PATCH` shorthand for [`execute`](Self::execute) with a JSON body.
	pub async fn patch<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::patch(endpoint).json(body)?).await
	}

	/// `DELETE` shorthand for [`execute`](Self::execute).
	pub async fn delete<R>(&self, endpoint: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::delete(endpoint)).await
	}

	/// Persists a credential obtained by a login flow.
	///
	/// A credential without a refresh token overwrites any previously stored one with a blank
	/// value, which reads back as absent.
	pub async fn sign_in(&self, credential: &Credential) -> Result<()> {
		let refresh_token = credential
			.refresh_token
			.as_ref()
			.map(|secret| secret.expose().to_owned())
			.unwrap_or_default();

		self.store
			.set(CredentialKey::AccessToken.as_str(), credential.access_token.expose().to_owned())
			.await?;
		self.store.set(CredentialKey::RefreshToken.as_str(), refresh_token).await?;

		Ok(())
	}

	/// Clears stored credentials without running the logout hook.
	pub async fn sign_out(&self) -> Result<()> {
		self.store.clear().await?;

		Ok(())
	}

	/// Returns the stored credential, or `None` when no access token is stored.
	pub async fn credential(&self) -> Result<Option<Credential>> {
		Ok(store::read_credential(self.store.as_ref()).await?)
	}

	/// Returns the refresh counters shared by every clone of this client.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	async fn dispatch(&self, request: &ApiRequest) -> Result<HttpResponse> {
		request.ensure_authorization_unset()?;

		let url = self.config.resolve(&request.endpoint)?;
		let ticket = self.coordinator.ticket();
		let access_token =
			store::read_secret(self.store.as_ref(), CredentialKey::AccessToken).await?;
		let response = self.transmit(request, &url, access_token.as_ref()).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}

		let settlement =
			self.coordinator.start_or_join(ticket, || self.renew_credential()).await;

		if settlement.joined {
			self.refresh_metrics.record_join();
		}

		let credential = settlement.outcome?;

		self.retry(request, &url, &credential, settlement.generation).await
	}

	async fn retry(
		&self,
		request: &ApiRequest,
		url: &Url,
		credential: &Credential,
		generation: u64,
	) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Retry;

		let span = FlowSpan::new(KIND, "retry");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response =
					self.transmit(request, url, Some(&credential.access_token)).await?;

				if response.status() != StatusCode::UNAUTHORIZED {
					return Ok(response);
				}

				let reason = RefreshFailure::RetryRejected;

				match self.coordinator.expire(generation) {
					Expiry::Teardown => self.end_session(&reason).await,
					Expiry::Expired => (),
					// A newer credential exists, so this rejection says nothing about the session.
					Expiry::Superseded => return Ok(response),
				}

				Err(Error::from(reason))
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn transmit(
		&self,
		request: &ApiRequest,
		url: &Url,
		access_token: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let prepared = request.prepare(url, &self.config.default_headers, access_token)?;

		Ok(self.transport.execute(prepared).await?)
	}

	/// Clears stored credentials and runs the logout hook.
	async fn end_session(&self, reason: &RefreshFailure) {
		if let Err(e) = self.store.clear().await {
			obs::record_clear_failure(&e);
		}

		obs::record_session_expired(reason);
		self.logout_hook.on_session_expired(reason);
	}
}
#[cfg(feature = "reqwest")]
impl AuthClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(store: Arc<dyn CredentialStore>, config: ClientConfig) -> Self {
		Self::with_transport(store, config, ReqwestTransport::default())
	}

	/// Creates a client whose reqwest transport is built from `builder`.
	pub fn with_client_builder(
		store: Arc<dyn CredentialStore>,
		config: ClientConfig,
		builder: reqwest::ClientBuilder,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_transport(store, config, ReqwestTransport::from_builder(builder)?))
	}

	/// Creates a reqwest-backed client whose base URL comes from `PUBLIC_API_URL`.
	pub fn from_env(store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
		Ok(Self::new(store, ClientConfig::from_env()?))
	}
}
impl<C> Clone for AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			logout_hook: self.logout_hook.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<C> Debug for AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_endpoint", &self.config.refresh_endpoint.as_str())
			.field("refresh_in_flight", &self.coordinator.in_flight())
			.finish()
	}
}

fn decode_response<R>(response: HttpResponse) -> Result<R>
where
	R: DeserializeOwned,
{
	let status = response.status();
	let body = response.into_body();

	if !status.is_success() {
		return Err(Error::Http { status: status.as_u16(), body: error_body(&body) });
	}

	let payload: &[u8] =
		if body.iter().all(u8::is_ascii_whitespace) { b"null".as_slice() } else { &body };
	let mut deserializer = serde_json::Deserializer::from_slice(payload);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { status: status.as_u16(), source })
}

fn error_body(body: &[u8]) -> serde_json::Value {
	serde_json::from_slice(body).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
}
