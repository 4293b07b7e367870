//! Logout side effect invoked when a session ends.

// self
use crate::error::RefreshFailure;

/// Side effect run once per terminal session failure.
///
/// Browser clients navigate to a login view here; CLI tools typically print a hint and exit.
/// The hook fires once per failed refresh no matter how many requests were waiting on it, and
/// never for an explicit [`AuthClient::sign_out`](crate::client::AuthClient::sign_out).
pub trait LogoutHook
where
	Self: Send + Sync,
{
	/// Called after stored credentials were cleared.
	fn on_session_expired(&self, reason: &RefreshFailure);
}
impl<F> LogoutHook for F
where
	F: Send + Sync + Fn(&RefreshFailure),
{
	fn on_session_expired(&self, reason: &RefreshFailure) {
		self(reason)
	}
}

pub(crate) fn noop(_reason: &RefreshFailure) {}
