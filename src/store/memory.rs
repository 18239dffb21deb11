//! Thread-safe in-memory [`CredentialStore`] for tests and single-process demos.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{CredentialStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<TokenPair>>>;

/// Keeps the token pair in-process; contents vanish with the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-seeded with `pair`.
	pub fn with_pair(pair: TokenPair) -> Self {
		Self(Arc::new(RwLock::new(Some(pair))))
	}

	/// Returns `true` when a pair is currently stored.
	pub fn is_populated(&self) -> bool {
		self.0.read().is_some()
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(pair);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<TokenPair>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
