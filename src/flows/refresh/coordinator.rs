// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{_prelude::*, auth::Secret};

pub(crate) type SharedRefresh = Shared<BoxFuture<'static, Result<Secret>>>;

/// How a caller took part in a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefreshRole {
	/// The caller started the exchange.
	Leader,
	/// The caller attached to an exchange already in flight.
	Follower,
}

struct InFlight {
	generation: u64,
	refresh: SharedRefresh,
}

/// Single-flight gate in front of the token endpoint.
///
/// The slot holds the pending refresh while it runs and is emptied by the refresh itself once it
/// resolves, whatever the outcome. The mutex is only held to inspect or swap the slot, never
/// across an await.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
	in_flight: Mutex<Option<InFlight>>,
	generation: AtomicU64,
}
impl RefreshCoordinator {
	/// Returns the refresh every concurrent caller should await.
	///
	/// `start` is only invoked when no unresolved refresh occupies the slot.
	pub(crate) fn join_or_start<F>(self: &Arc<Self>, start: F) -> (SharedRefresh, RefreshRole)
	where
		F: FnOnce() -> BoxFuture<'static, Result<Secret>>,
	{
		let mut slot = self.in_flight.lock();

		if let Some(in_flight) = slot.as_ref() {
			// A resolved refresh is stale even if it has not been released yet.
			if in_flight.refresh.peek().is_none() {
				return (in_flight.refresh.clone(), RefreshRole::Follower);
			}
		}

		let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
		let coordinator = Arc::downgrade(self);
		let work = start();
		let refresh = async move {
			let result = work.await;

			release(&coordinator, generation);

			result
		}
		.boxed()
		.shared();

		*slot = Some(InFlight { generation, refresh: refresh.clone() });

		(refresh, RefreshRole::Leader)
	}

	#[cfg(test)]
	fn is_idle(&self) -> bool {
		self.in_flight.lock().is_none()
	}
}

fn release(coordinator: &Weak<RefreshCoordinator>, generation: u64) {
	let Some(coordinator) = coordinator.upgrade() else {
		return;
	};
	let mut slot = coordinator.in_flight.lock();

	if slot.as_ref().is_some_and(|in_flight| in_flight.generation == generation) {
		*slot = None;
	}
}
