//! Calls a real API through the default reqwest transport with a file-backed session.
//!
//! ```sh
//! PUBLIC_API_URL=http://localhost:8000 cargo run --example reqwest_session -- <access> <refresh>
//! ```
//!
//! Tokens passed on the command line are persisted to `session.json` in the working directory;
//! later runs reuse (and refresh) whatever is stored there.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use serde_json::Value;
// self
use bearer_session::{
	auth::Credential,
	client::ReqwestAuthClient,
	error::{Error, RefreshFailure},
	store::FileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store = FileStore::open("session.json")?;
	let client = ReqwestAuthClient::from_env(Arc::new(store))?.with_logout_hook(
		|reason: &RefreshFailure| eprintln!("Session expired ({reason}); sign in again."),
	);
	let mut args = env::args().skip(1);

	if let (Some(access), Some(refresh)) = (args.next(), args.next()) {
		client.sign_in(&Credential::new(access, refresh)).await?;
	}

	println!("Calling {}api/auth/me.", client.config.base_url);

	match client.get::<Value>("/api/auth/me").await {
		Ok(profile) => println!("{profile:#}"),
		Err(Error::Http { status, body }) => println!("API answered {status}: {body}."),
		Err(e) if e.is_terminal() => println!("Not signed in: {e}"),
		Err(e) => return Err(e.into()),
	}

	let metrics = client.refresh_metrics();

	println!(
		"Refreshes: {} attempted, {} succeeded, {} failed.",
		metrics.attempts(),
		metrics.successes(),
		metrics.failures()
	);

	Ok(())
}
