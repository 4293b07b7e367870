// self
use crate::error::RefreshFailure;

/// Decides how the client reacts when the refresh call itself fails.
///
/// Only transport failures are eligible for another attempt; a refresh endpoint that answers
/// (with a rejection or a malformed body) has given its verdict and the session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshPolicy {
	/// Extra refresh calls issued immediately after a transport failure.
	pub transport_retries: u32,
}
impl RefreshPolicy {
	/// Ends the session on the first refresh failure.
	pub const fn terminate_immediately() -> Self {
		Self { transport_retries: 0 }
	}

	/// Re-issues the refresh call up to `retries` extra times after transport failures.
	pub const fn retry_transport(retries: u32) -> Self {
		Self { transport_retries: retries }
	}

	/// Returns `true` when `failure` on zero-based `attempt` should be followed by another call.
	pub fn should_retry(&self, attempt: u32, failure: &RefreshFailure) -> bool {
		failure.is_transient() && attempt < self.transport_retries
	}
}
