//! Token refresh flow shared by every request that observes a 401.
//!
//! [`AuthClient`] routes each 401 through the coordinator, which guarantees that only one
//! refresh call is outstanding per client. The flow body reads the stored refresh token, posts
//! it to the configured refresh endpoint, persists the renewed credential, and on any failure
//! clears the store and fires the logout hook before the outcome is handed to waiting callers.

pub(crate) mod coordinator;

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, RefreshRequestBody, TokenResponse, TokenSecret},
	client::{AuthClient, refresh::coordinator::RefreshOutcome},
	error::RefreshFailure,
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request,
	store::{self, StoreError},
};

impl<C> AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Renews the stored credential; runs at most once per refresh flight.
	pub(crate) async fn renew_credential(&self) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "renew_credential");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome = span.instrument(self.try_renew()).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&outcome));

		match &outcome {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(reason) => {
				self.refresh_metrics.record_failure();
				self.end_session(reason).await;
			},
		}

		outcome
	}

	async fn try_renew(&self) -> RefreshOutcome {
		let refresh_token = store::read_secret(self.store.as_ref(), CredentialKey::RefreshToken)
			.await
			.map_err(storage_failure)?
			.ok_or(RefreshFailure::MissingRefreshToken)?;
		let mut attempt = 0;
		let response = loop {
			match self.call_refresh_endpoint(&refresh_token).await {
				Err(failure) if self.config.refresh_policy.should_retry(attempt, &failure) => {
					attempt += 1;
				},
				result => break result?,
			}
		};
		let credential = response.into_credential(Some(refresh_token))?;

		store::write_credential(self.store.as_ref(), &credential).await.map_err(storage_failure)?;

		Ok(credential)
	}

	async fn call_refresh_endpoint(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<TokenResponse, RefreshFailure> {
		let body = serde_json::to_vec(&RefreshRequestBody { refresh_token: refresh_token.expose() })
			.map_err(|e| RefreshFailure::Request { message: describe(&e) })?;
		let request = request::refresh_request(&self.config.refresh_endpoint, body)
			.map_err(|e| RefreshFailure::Request { message: describe(&e) })?;
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| RefreshFailure::Network { message: describe(&e) })?;
		let status = response.status();

		if !status.is_success() {
			return Err(RefreshFailure::Rejected { status: status.as_u16() });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| RefreshFailure::MalformedResponse { message: e.to_string() })
	}
}

fn storage_failure(error: StoreError) -> RefreshFailure {
	RefreshFailure::Storage { message: error.to_string() }
}

/// Renders an error together with its source chain on one line.
fn describe(error: &dyn StdError) -> String {
	let mut message = error.to_string();
	let mut source = error.source();

	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());

		source = cause.source();
	}

	message
}
