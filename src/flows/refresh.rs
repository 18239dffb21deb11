//! Refresh-token exchange behind a single-flight gate.
//!
//! [`TinyClient::refresh_access_token`] is what the request executor calls after a 401. The first
//! caller starts the exchange; everyone arriving while it runs awaits the same shared future and
//! observes the same token or the same error. A rejected refresh clears the store so the next
//! request fails fast with [`Error::Unauthenticated`] instead of retrying a dead session.

mod coordinator;
mod metrics;

pub use metrics::RefreshMetrics;

pub(crate) use coordinator::{RefreshCoordinator, RefreshRole};

// crates.io
use futures::FutureExt;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	flows::TinyClient,
	http::HttpTransport,
	oauth::{TokenFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, flow_event},
	store::CredentialStore,
};

impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the stored refresh token for a new pair and returns the new access token.
	///
	/// Concurrent calls share one token-endpoint request. Fails with
	/// [`Error::NoRefreshToken`] when nothing is stored and with [`Error::SessionExpired`] when
	/// the provider rejects the refresh token; in the latter case the store has been cleared.
	/// Transport failures and timeouts leave the stored pair untouched.
	///
	/// Writes are conditional on the stored refresh token still being the one that was exchanged,
	/// so a pair saved by a concurrent code exchange is neither overwritten nor cleared.
	pub async fn refresh_access_token(&self) -> Result<Secret> {
		let (refresh, role) = self.refresh.join_or_start(|| {
			const KIND: FlowKind = FlowKind::Refresh;

			let span = FlowSpan::new(KIND, "refresh_access_token");
			let facade = self.token_facade();
			let store = self.store.clone();
			let metrics = self.refresh_metrics.clone();
			let write_guard = self.write_guard.clone();

			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			span.instrument(async move {
				let result = rotate(facade?, store.as_ref(), &metrics, &write_guard).await;

				obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

				result
			})
			.boxed()
		});

		if role == RefreshRole::Follower {
			self.refresh_metrics.record_attached();

			flow_event!(debug, "Attaching to the token refresh already in flight.");
		}

		refresh.await
	}
}

async fn rotate<C, M>(
	facade: TokenFacade<C, M>,
	store: &dyn CredentialStore,
	metrics: &RefreshMetrics,
	write_guard: &AsyncMutex<()>,
) -> Result<Secret>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let current = store.load().await?.ok_or(Error::NoRefreshToken)?;

	flow_event!(debug, "Refreshing the Tiny access token.");
	metrics.record_attempt();

	match facade.refresh_token(&current.refresh_token).await {
		Ok(pair) => {
			let access_token = pair.access_token.clone();
			let _write = write_guard.lock().await;

			match store.load().await.inspect_err(|_| metrics.record_failure())? {
				Some(stored) if stored.refresh_token == current.refresh_token => {
					store.save(pair).await.inspect_err(|_| metrics.record_failure())?;
					metrics.record_success();

					Ok(access_token)
				},
				Some(stored) => {
					metrics.record_success();

					flow_event!(debug, "A newer token pair was stored during the refresh; keeping it.");

					Ok(stored.access_token)
				},
				None => {
					metrics.record_failure();

					Err(Error::Unauthenticated)
				},
			}
		},
		Err(Error::TokenRejected { status, message, .. }) => {
			metrics.record_failure();

			flow_event!(
				warn,
				status,
				reason = %message,
				"Token endpoint rejected the refresh."
			);

			let _write = write_guard.lock().await;
			let superseded = store
				.load()
				.await
				.ok()
				.flatten()
				.is_some_and(|stored| stored.refresh_token != current.refresh_token);

			if superseded {
				flow_event!(debug, "A newer token pair was stored during the refresh; not clearing it.");
			} else if let Err(_err) = store.clear().await {
				flow_event!(warn, error = %_err, "Failed to clear rejected credentials.");
			}

			Err(Error::SessionExpired { status, message })
		},
		Err(e) => {
			metrics.record_failure();

			Err(e)
		},
	}
}
