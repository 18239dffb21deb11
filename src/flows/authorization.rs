//! Authorization-code entry point: authorize URL construction and code exchange.

mod session;

pub use session::AuthorizationSession;

// self
use crate::{
	_prelude::*,
	flows::TinyClient,
	http::HttpTransport,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, flow_event},
};

impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorize URL the user must visit to grant access.
	///
	/// The returned session carries a random `state`; compare it against the redirect's `state`
	/// with [`AuthorizationSession::validate_state`] before calling
	/// [`TinyClient::exchange_code_for_token`].
	pub fn start_authentication(&self) -> AuthorizationSession {
		session::build_session(
			&self.descriptor,
			&self.credentials.client_id,
			&self.credentials.redirect_uri,
		)
	}

	/// Exchanges the authorization code from the redirect for a token pair and stores it.
	///
	/// A provider rejection surfaces as [`Error::TokenRejected`] and leaves the store untouched.
	pub async fn exchange_code_for_token(&self, code: &str) -> Result<()> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code_for_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let facade = self.token_facade()?;
				let _write = self.write_guard.lock().await;
				let pair = facade.exchange_authorization_code(code).await?;

				self.store.save(pair).await?;

				flow_event!(debug, "Stored the token pair issued for the authorization code.");

				Ok(())
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}
}
