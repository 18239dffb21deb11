//! Credential storage contract and built-in store implementations.
//!
//! The store exclusively owns the medium holding the [`TokenPair`]. Only the refresh coordinator
//! and the authorization-code exchange write to it; the request executor only reads.

pub mod cookie;
pub mod file;
pub mod memory;

pub use cookie::CookieStore;
pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenPair};

/// Boxed future returned by [`CredentialStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single Tiny token pair.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces both tokens with their expiries.
	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()>;

	/// Returns the stored pair, or `None` if either token is absent.
	///
	/// Expiry is not checked here; the provider's rejection is the source of truth.
	fn load(&self) -> StoreFuture<'_, Option<TokenPair>>;

	/// Removes both tokens.
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

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "cookie jar unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("cookie jar unavailable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
