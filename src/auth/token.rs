//! OAuth token pair with independent access/refresh expiries.

// self
use crate::{_prelude::*, auth::Secret};

/// Lifetime assumed for every refresh token, independent of the token endpoint response.
///
/// Tiny's realm does not report the refresh lifetime alongside `expires_in`, so the pair stamps a
/// fixed 24 hour window at issue time.
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::seconds(86_400);

/// Errors produced by [`TokenPairBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenPairBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no refresh token value was provided.
	#[error("Refresh token is required.")]
	MissingRefreshToken,
	/// Issued when no access-token lifetime was configured.
	#[error("Access token expiry must be supplied via expires_in or access_expires_at.")]
	MissingExpiry,
}

/// Access + refresh tokens issued by one successful token exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Bearer token sent to resource endpoints.
	pub access_token: Secret,
	/// Token exchanged for a new pair once the access token is rejected.
	pub refresh_token: Secret,
	/// Instant the access token stops being valid (`issued_at + expires_in`).
	pub access_expires_at: OffsetDateTime,
	/// Instant the refresh token stops being valid (`issued_at + 24h`).
	pub refresh_expires_at: OffsetDateTime,
}
impl TokenPair {
	/// Returns a builder for a freshly issued pair.
	pub fn builder() -> TokenPairBuilder {
		TokenPairBuilder::default()
	}

	/// Returns `true` if the access token has expired at the provided instant.
	///
	/// Informational only; the executor relies on the provider's 401 instead of local clocks.
	pub fn is_access_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.access_expires_at
	}

	/// Returns `true` if the refresh token has expired at the provided instant.
	pub fn is_refresh_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.refresh_expires_at
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("access_expires_at", &self.access_expires_at)
			.field("refresh_expires_at", &self.refresh_expires_at)
			.finish()
	}
}

/// Builder for [`TokenPair`].
#[derive(Clone, Debug, Default)]
pub struct TokenPairBuilder {
	access_token: Option<Secret>,
	refresh_token: Option<Secret>,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	access_expires_at: Option<OffsetDateTime>,
	refresh_expires_at: Option<OffsetDateTime>,
}
impl TokenPairBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(Secret::new(token));

		self
	}

	/// Sets the issue instant; defaults to the current clock.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the provider-reported access-token lifetime.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Restores absolute expiries, e.g. when rehydrating a pair from cookies.
	pub fn expires_at(mut self, access: OffsetDateTime, refresh: OffsetDateTime) -> Self {
		self.access_expires_at = Some(access);
		self.refresh_expires_at = Some(refresh);

		self
	}

	/// Consumes the builder and produces a [`TokenPair`].
	pub fn build(self) -> Result<TokenPair, TokenPairBuilderError> {
		let access_token = self.access_token.ok_or(TokenPairBuilderError::MissingAccessToken)?;
		let refresh_token = self.refresh_token.ok_or(TokenPairBuilderError::MissingRefreshToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let access_expires_at = match (self.access_expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(TokenPairBuilderError::MissingExpiry),
		};
		let refresh_expires_at =
			self.refresh_expires_at.unwrap_or(issued_at + REFRESH_TOKEN_LIFETIME);

		Ok(TokenPair { access_token, refresh_token, access_expires_at, refresh_expires_at })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiries_derive_from_issue_instant() {
		let issued = macros::datetime!(2025-06-24 12:00 UTC);
		let pair = TokenPair::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(issued)
			.expires_in(Duration::seconds(3_600))
			.build()
			.expect("Token pair builder should succeed with a relative expiry.");

		assert_eq!(pair.access_expires_at, macros::datetime!(2025-06-24 13:00 UTC));
		assert_eq!(pair.refresh_expires_at, macros::datetime!(2025-06-25 12:00 UTC));
	}

	#[test]
	fn refresh_lifetime_ignores_reported_expiry() {
		let issued = macros::datetime!(2025-06-24 12:00 UTC);
		let pair = TokenPair::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(issued)
			.expires_in(Duration::days(30))
			.build()
			.expect("Token pair builder should succeed with a long access lifetime.");

		assert_eq!(pair.refresh_expires_at - issued, REFRESH_TOKEN_LIFETIME);
		assert!(pair.is_refresh_expired_at(macros::datetime!(2025-06-25 12:00 UTC)));
		assert!(!pair.is_access_expired_at(macros::datetime!(2025-06-25 12:00 UTC)));
	}

	#[test]
	fn builder_requires_both_tokens_and_expiry() {
		let err = TokenPair::builder()
			.refresh_token("refresh")
			.expires_in(Duration::hours(1))
			.build()
			.expect_err("Missing access token should fail.");

		assert_eq!(err, TokenPairBuilderError::MissingAccessToken);

		let err = TokenPair::builder()
			.access_token("access")
			.expires_in(Duration::hours(1))
			.build()
			.expect_err("Missing refresh token should fail.");

		assert_eq!(err, TokenPairBuilderError::MissingRefreshToken);

		let err = TokenPair::builder()
			.access_token("access")
			.refresh_token("refresh")
			.build()
			.expect_err("Missing expiry should fail.");

		assert_eq!(err, TokenPairBuilderError::MissingExpiry);
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let pair = TokenPair::builder()
			.access_token("access-secret")
			.refresh_token("refresh-secret")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token pair builder should succeed.");
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
	}
}
