//! Credential persistence contract and built-in store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKey, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// String key-value backend holding the session credential.
///
/// The client only ever touches the `access_token` and `refresh_token` keys (see
/// [`CredentialKey`]), but stores are free to hold unrelated entries; [`clear`](Self::clear)
/// removes everything, mirroring browser storage semantics.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Removes every stored entry.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Reads one credential half, treating blank values as absent.
pub(crate) async fn read_secret(
	store: &dyn CredentialStore,
	key: CredentialKey,
) -> Result<Option<TokenSecret>, StoreError> {
	let value = store.get(key.as_str()).await?;

	Ok(value.map(TokenSecret::new).filter(|secret| !secret.is_blank()))
}

/// Reads the full credential; `None` when no access token is stored.
pub(crate) async fn read_credential(
	store: &dyn CredentialStore,
) -> Result<Option<Credential>, StoreError> {
	let Some(access_token) = read_secret(store, CredentialKey::AccessToken).await? else {
		return Ok(None);
	};
	let refresh_token = read_secret(store, CredentialKey::RefreshToken).await?;

	Ok(Some(Credential { access_token, refresh_token }))
}

/// Persists the access token and, when present, the refresh token.
///
/// A credential without a refresh token leaves the stored refresh token untouched.
pub(crate) async fn write_credential(
	store: &dyn CredentialStore,
	credential: &Credential,
) -> Result<(), StoreError> {
	store
		.set(CredentialKey::AccessToken.as_str(), credential.access_token.expose().to_owned())
		.await?;

	if let Some(refresh) = credential.refresh_token.as_ref() {
		store.set(CredentialKey::RefreshToken.as_str(), refresh.expose().to_owned()).await?;
	}

	Ok(())
}
