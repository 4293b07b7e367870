//! Demonstrates plugging a custom transport into [`AuthClient`].
//!
//! 1. Implement [`HttpTransport`] for any type that can turn an [`HttpRequest`] into an
//!    [`HttpResponse`]. Here an in-process mock plays both the API and its refresh endpoint.
//! 2. Pass the transport to [`AuthClient::with_transport`] together with a credential store and a
//!    configuration.
//! 3. Register a logout hook so the program learns when the session cannot be recovered.

// std
use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};
// crates.io
use color_eyre::Result;
use serde::Deserialize;
// self
use bearer_session::{
	auth::Credential,
	client::AuthClient,
	config::ClientConfig,
	error::{Error, RefreshFailure},
	http::{HttpRequest, HttpResponse, HttpTransport, StatusCode, TransportFuture, header},
	store::{CredentialStore, MemoryStore},
};

#[derive(Debug, Deserialize)]
struct Profile {
	email: String,
	plan: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store = MemoryStore::default();
	let config = ClientConfig::from_base_url("https://api.example.com")?;
	let transport = Arc::new(MockApi::default());
	let client: AuthClient<MockApi> = AuthClient::with_transport(
		Arc::new(store.clone()) as Arc<dyn CredentialStore>,
		config,
		transport.clone(),
	)
	.with_logout_hook(|reason: &RefreshFailure| {
		println!("Session ended ({reason}); the user has to sign in again.");
	});

	client.sign_in(&Credential::new("expired-access", "refresh-1")).await?;

	let profile: Profile = client.get("/api/me").await?;

	println!("Signed in as {} on the {} plan.", profile.email, profile.plan);
	println!(
		"Refresh attempts: {}; stored access token now ends with `{}`.",
		client.refresh_metrics().attempts(),
		store.snapshot("access_token").unwrap_or_default().chars().rev().take(4).collect::<String>()
	);

	transport.revoke();

	match client.get::<Profile>("/api/me").await {
		Ok(_) => println!("The mock unexpectedly accepted a revoked session."),
		Err(Error::SessionExpired { reason }) => {
			println!("Request failed after the refresh was rejected: {reason}.");
		},
		Err(e) => return Err(e.into()),
	}

	println!("Credential store is empty after teardown: {}.", store.is_empty());

	Ok(())
}

/// Mock API that only accepts tokens minted by its own refresh endpoint.
#[derive(Debug, Default)]
struct MockApi {
	revoked: AtomicBool,
}
impl MockApi {
	const ISSUED: &'static str = "Bearer renewed-access";

	fn revoke(&self) {
		self.revoked.store(true, Ordering::SeqCst);
	}

	fn respond(&self, request: &HttpRequest) -> HttpResponse {
		let revoked = self.revoked.load(Ordering::SeqCst);

		if request.uri().path() == ClientConfig::DEFAULT_REFRESH_PATH {
			return if revoked {
				json(StatusCode::UNAUTHORIZED, r#"{"detail":"Refresh token revoked"}"#)
			} else {
				json(
					StatusCode::OK,
					r#"{"access_token":"renewed-access","refresh_token":"refresh-2","token_type":"bearer"}"#,
				)
			};
		}

		let authorized = request
			.headers()
			.get(header::AUTHORIZATION)
			.is_some_and(|value| value.as_bytes() == Self::ISSUED.as_bytes());

		if authorized && !revoked {
			json(StatusCode::OK, r#"{"email":"ada@example.com","plan":"team"}"#)
		} else {
			json(StatusCode::UNAUTHORIZED, r#"{"detail":"Not authenticated"}"#)
		}
	}
}
impl HttpTransport for MockApi {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let response = self.respond(&request);

		Box::pin(async move { Ok(response) })
	}
}

fn json(status: StatusCode, body: &str) -> HttpResponse {
	let mut response = HttpResponse::new(body.as_bytes().to_vec());

	*response.status_mut() = status;

	response
}
