#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use bearer_session::{
	auth::Credential,
	client::ReqwestAuthClient,
	config::ClientConfig,
	error::{Error, TransportError},
	store::MemoryStore,
};

fn client_for(base_url: &str) -> (ReqwestAuthClient, MemoryStore) {
	let store = MemoryStore::default();
	let config = ClientConfig::from_base_url(base_url).expect("Mock base URL should be valid.");
	let client = ReqwestAuthClient::new(Arc::new(store.clone()), config);

	(client, store)
}

#[tokio::test]
async fn expired_access_token_is_refreshed_over_http() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/workflows").header("authorization", "Bearer stale");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"detail":"Token expired"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh")
				.header("content-type", "application/json")
				.json_body(json!({ "refresh_token": "refresh-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"fresh","refresh_token":"refresh-2","token_type":"bearer"}"#);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/workflows").header("authorization", "Bearer fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"id":1,"name":"triage"}]"#);
		})
		.await;
	let (client, store) = client_for(&server.base_url());

	client
		.sign_in(&Credential::new("stale", "refresh-1"))
		.await
		.expect("Sign-in should persist the credential.");

	let workflows: Vec<Value> =
		client.get("api/workflows").await.expect("Request should succeed after the refresh.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(workflows, vec![json!({ "id": 1, "name": "triage" })]);
	assert_eq!(store.snapshot("access_token").as_deref(), Some("fresh"));
	assert_eq!(store.snapshot("refresh_token").as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn non_json_error_bodies_become_empty_objects() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(PATCH).path("/api/workflows/7");
			then.status(502).header("content-type", "text/html").body("<h1>Bad Gateway</h1>");
		})
		.await;
	let (client, _store) = client_for(&server.base_url());

	client
		.sign_in(&Credential::new("access", "refresh"))
		.await
		.expect("Sign-in should persist the credential.");

	let err = client
		.patch::<_, Value>("/api/workflows/7", &json!({ "name": "renamed" }))
		.await
		.expect_err("502 should surface as an HTTP error.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::Http { status: 502, ref body } if body == &json!({})));
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/v1/sessions/current");
			then.status(204);
		})
		.await;
	let (client, _store) = client_for(&server.url("/v1"));
	let () = client.delete("/sessions/current").await.expect("204 should decode into unit.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unreachable_hosts_surface_transport_errors() {
	let (client, _store) = client_for("http://127.0.0.1:9");
	let err = client.get::<Value>("/api/me").await.expect_err("Nothing listens on port 9.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
}

#[tokio::test]
async fn configured_reqwest_builders_carry_their_settings() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/health").header("user-agent", "bearer-session-tests");
			then.status(200).header("content-type", "application/json").body(r#"{"ok":true}"#);
		})
		.await;
	let config =
		ClientConfig::from_base_url(&server.base_url()).expect("Mock base URL should be valid.");
	let builder = bearer_session::reqwest::Client::builder()
		.user_agent("bearer-session-tests")
		.timeout(std::time::Duration::from_secs(5));
	let client =
		ReqwestAuthClient::with_client_builder(Arc::new(MemoryStore::default()), config, builder)
			.expect("Configured reqwest client should build.");
	let health: Value = client.get("/api/health").await.expect("Health check should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(health, json!({ "ok": true }));
}
