//! Scripted in-process backend shared by the session integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use tokio::sync::Semaphore;
// self
use bearer_session::{
	auth::Credential,
	client::AuthClient,
	config::{ClientConfig, RefreshPolicy},
	error::{RefreshFailure, TransportError},
	http::{HttpRequest, HttpResponse, HttpTransport, StatusCode, TransportFuture, header},
	store::{CredentialStore, MemoryStore},
};

pub const BASE_URL: &str = "http://api.test";
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Scripted answer for one refresh call.
#[derive(Clone, Debug)]
pub enum RefreshReply {
	/// 200 with a token response; the API starts accepting `access`.
	Issue { access: &'static str, refresh: Option<&'static str> },
	/// Non-success status with an empty body.
	Status(u16),
	/// 200 with a raw body.
	Body(&'static str),
	/// Transport failure before any response.
	NetworkDown,
}

/// In-process stand-in for the API plus its refresh endpoint.
///
/// API calls succeed when they carry the currently accepted access token and answer 401
/// otherwise. Refresh calls pop the next [`RefreshReply`]; once the script runs out they are
/// rejected with 401. When a gate is installed, refresh calls block until a permit is added.
#[derive(Debug, Default)]
pub struct FakeBackend {
	accepted: Mutex<String>,
	replies: Mutex<VecDeque<RefreshReply>>,
	gate: Option<Arc<Semaphore>>,
	lock_out: AtomicBool,
	api_calls: AtomicUsize,
	refresh_calls: AtomicUsize,
	unauthorized: AtomicUsize,
	api_authorizations: Mutex<Vec<Option<String>>>,
	refresh_bodies: Mutex<Vec<serde_json::Value>>,
}
impl FakeBackend {
	pub fn accepting(token: &str) -> Self {
		Self { accepted: Mutex::new(token.into()), ..Default::default() }
	}

	pub fn with_replies(self, replies: impl IntoIterator<Item = RefreshReply>) -> Self {
		self.replies.lock().extend(replies);

		self
	}

	/// Blocks refresh calls until [`Semaphore::add_permits`] is called on the returned gate.
	pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
		let gate = Arc::new(Semaphore::new(0));

		self.gate = Some(gate.clone());

		(self, gate)
	}

	/// Makes the API reject every token, including freshly issued ones.
	pub fn locked_out(self) -> Self {
		self.lock_out.store(true, Ordering::SeqCst);

		self
	}

	pub fn accept(&self, token: &str) {
		*self.accepted.lock() = token.into();
	}

	pub fn api_calls(&self) -> usize {
		self.api_calls.load(Ordering::SeqCst)
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	pub fn unauthorized(&self) -> usize {
		self.unauthorized.load(Ordering::SeqCst)
	}

	pub fn api_authorizations(&self) -> Vec<Option<String>> {
		self.api_authorizations.lock().clone()
	}

	pub fn refresh_bodies(&self) -> Vec<serde_json::Value> {
		self.refresh_bodies.lock().clone()
	}

	async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		if request.uri().path() == REFRESH_PATH {
			self.refresh(request).await
		} else {
			Ok(self.api(request))
		}
	}

	fn api(&self, request: HttpRequest) -> HttpResponse {
		self.api_calls.fetch_add(1, Ordering::SeqCst);

		let authorization = request
			.headers()
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		self.api_authorizations.lock().push(authorization.clone());

		let expected = format!("Bearer {}", self.accepted.lock());

		if self.lock_out.load(Ordering::SeqCst) || authorization.as_deref() != Some(&expected) {
			self.unauthorized.fetch_add(1, Ordering::SeqCst);

			return json_response(StatusCode::UNAUTHORIZED, r#"{"detail":"Not authenticated"}"#);
		}

		match request.uri().path() {
			"/broken" => json_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
			"/missing" => json_response(StatusCode::NOT_FOUND, r#"{"detail":"Not found"}"#),
			"/empty" => json_response(StatusCode::NO_CONTENT, ""),
			path => json_response(
				StatusCode::OK,
				&serde_json::json!({ "path": path, "method": request.method().as_str() })
					.to_string(),
			),
		}
	}

	async fn refresh(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		self.refresh_calls.fetch_add(1, Ordering::SeqCst);

		let body = serde_json::from_slice(request.body()).unwrap_or(serde_json::Value::Null);

		self.refresh_bodies.lock().push(body);

		if let Some(gate) = self.gate.as_ref() {
			let _permit = gate.acquire().await.expect("Refresh gate should stay open.");
		}

		let reply = self.replies.lock().pop_front().unwrap_or(RefreshReply::Status(401));

		match reply {
			RefreshReply::Issue { access, refresh } => {
				self.accept(access);

				let mut body = serde_json::json!({ "access_token": access, "token_type": "bearer" });

				if let Some(refresh) = refresh {
					body["refresh_token"] = refresh.into();
				}

				Ok(json_response(StatusCode::OK, &body.to_string()))
			},
			RefreshReply::Status(status) => Ok(json_response(
				StatusCode::from_u16(status).expect("Scripted status should be valid."),
				"",
			)),
			RefreshReply::Body(body) => Ok(json_response(StatusCode::OK, body)),
			RefreshReply::NetworkDown => Err(TransportError::network(
				request.uri().to_string(),
				std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
			)),
		}
	}
}
impl HttpTransport for FakeBackend {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(self.handle(request))
	}
}

/// Logout hook that records every reason it was called with.
#[derive(Clone, Debug, Default)]
pub struct RecordingHook(Arc<Mutex<Vec<RefreshFailure>>>);
impl RecordingHook {
	pub fn calls(&self) -> Vec<RefreshFailure> {
		self.0.lock().clone()
	}

	pub fn hook(&self) -> impl 'static + Fn(&RefreshFailure) + Send + Sync {
		let calls = self.0.clone();

		move |reason: &RefreshFailure| calls.lock().push(reason.clone())
	}
}

/// Client wired to `backend`, a fresh [`MemoryStore`], and a [`RecordingHook`].
pub struct Harness {
	pub client: AuthClient<FakeBackend>,
	pub backend: Arc<FakeBackend>,
	pub store: MemoryStore,
	pub hook: RecordingHook,
}
impl Harness {
	pub fn new(backend: FakeBackend) -> Self {
		Self::with_policy(backend, RefreshPolicy::default())
	}

	pub fn with_policy(backend: FakeBackend, policy: RefreshPolicy) -> Self {
		let backend = Arc::new(backend);
		let store = MemoryStore::default();
		let hook = RecordingHook::default();
		let config = ClientConfig::builder(BASE_URL.parse().expect("Base URL fixture should parse."))
			.refresh_path(REFRESH_PATH)
			.refresh_policy(policy)
			.build()
			.expect("Config fixture should build.");
		let client = AuthClient::with_transport(
			Arc::new(store.clone()) as Arc<dyn CredentialStore>,
			config,
			backend.clone(),
		)
		.with_logout_hook(hook.hook());

		Self { client, backend, store, hook }
	}

	pub async fn signed_in(self, access: &str, refresh: Option<&str>) -> Self {
		let credential = match refresh {
			Some(refresh) => Credential::new(access, refresh),
			None => Credential::access_only(access),
		};

		self.client.sign_in(&credential).await.expect("Sign-in should persist the credential.");

		self
	}
}

pub fn json_response(status: StatusCode, body: &str) -> HttpResponse {
	let mut response = HttpResponse::new(body.as_bytes().to_vec());

	*response.status_mut() = status;
	response
		.headers_mut()
		.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

	response
}
