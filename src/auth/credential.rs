//! Access/refresh token pair and the wire shapes exchanged with the refresh endpoint.

// self
use crate::{_prelude::*, auth::TokenSecret, error::RefreshFailure};

/// Store keys under which credential halves are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKey {
	/// Short-lived access token attached to API requests.
	AccessToken,
	/// Longer-lived token used to mint new access tokens.
	RefreshToken,
}
impl CredentialKey {
	/// Returns the persisted key name.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKey::AccessToken => "access_token",
			CredentialKey::RefreshToken => "refresh_token",
		}
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access token plus optional refresh token for the signed-in session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, when the server issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl Credential {
	/// Creates a credential with both halves present.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: Some(TokenSecret::new(refresh_token)),
		}
	}

	/// Creates a credential that cannot be refreshed.
	pub fn access_only(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access_token), refresh_token: None }
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// JSON body posted to the refresh endpoint.
#[derive(Serialize)]
pub(crate) struct RefreshRequestBody<'a> {
	pub(crate) refresh_token: &'a str,
}

/// JSON body returned by the refresh (and login) endpoints.
///
/// Both token fields are optional at the parsing stage so a missing access token can be told
/// apart from malformed JSON.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenResponse {
	/// Newly issued access token.
	#[serde(default)]
	pub access_token: Option<TokenSecret>,
	/// Rotated refresh token, when the server rotates them.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the server (usually `bearer`).
	#[serde(default)]
	pub token_type: Option<String>,
}
impl TokenResponse {
	/// Converts the response into a credential, falling back to `previous_refresh` when the
	/// server did not rotate the refresh token.
	pub fn into_credential(
		self,
		previous_refresh: Option<TokenSecret>,
	) -> Result<Credential, RefreshFailure> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_blank())
			.ok_or(RefreshFailure::MissingAccessToken)?;
		let refresh_token =
			self.refresh_token.filter(|token| !token.is_blank()).or(previous_refresh);

		Ok(Credential { access_token, refresh_token })
	}
}
