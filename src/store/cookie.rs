//! Cookie-jar [`CredentialStore`] mirroring the dashboard's http-only session cookies.
//!
//! The store keeps the current cookies per session and queues the `Set-Cookie` header values
//! the HTTP layer must attach to its next response. Both cookies are scoped to `/`, marked
//! `HttpOnly`, `Secure`, and `SameSite=Lax`, and carry independent `Expires` attributes taken
//! from the token pair. [`CookieStore::from_request_cookies`] rebuilds the jar for the next
//! request from the browser's `Cookie` header.

// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::{Secret, TokenPair},
	store::{CredentialStore, StoreError, StoreFuture},
};

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "tiny_access_token";
/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "tiny_refresh_token";

const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; Secure; SameSite=Lax";

/// One named session cookie with its expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
	/// Cookie name.
	pub name: &'static str,
	/// Cookie value; redacted in debug output.
	pub value: Secret,
	/// Absolute expiry rendered into the `Expires` attribute.
	pub expires: OffsetDateTime,
}
impl SessionCookie {
	/// Renders the `Set-Cookie` header value for this cookie.
	pub fn to_set_cookie(&self) -> Result<String, StoreError> {
		let expires = self.expires.format(&Rfc2822).map_err(|e| StoreError::Serialization {
			message: format!("Failed to format expiry for cookie {}: {e}", self.name),
		})?;

		Ok(format!("{}={}; Expires={expires}; {COOKIE_ATTRIBUTES}", self.name, self.value.expose()))
	}

	/// Renders a `Set-Cookie` header value that deletes the named cookie.
	pub fn removal(name: &str) -> String {
		format!("{name}=; Max-Age=0; {COOKIE_ATTRIBUTES}")
	}
}

#[derive(Debug, Default)]
struct CookieJar {
	access: Option<SessionCookie>,
	refresh: Option<SessionCookie>,
	pending: Vec<String>,
}

/// Session-scoped cookie jar implementing [`CredentialStore`].
#[derive(Clone, Debug, Default)]
pub struct CookieStore(Arc<Mutex<CookieJar>>);
impl CookieStore {
	/// Rehydrates the jar from the `Cookie` header of an incoming request.
	///
	/// Browsers send names and values only, so both expiries are set to the instant the header
	/// was read, which the cookies are known to outlive. The store starts empty unless both
	/// `tiny_access_token` and `tiny_refresh_token` carry a value. No `Set-Cookie` headers are
	/// queued.
	pub fn from_request_cookies(header: &str) -> Self {
		let observed_at = OffsetDateTime::now_utc();
		let (mut access, mut refresh) = (None, None);

		for (name, value) in header.split(';').filter_map(|pair| pair.split_once('=')) {
			let value = value.trim().trim_matches('"');

			if value.is_empty() {
				continue;
			}

			match name.trim() {
				ACCESS_TOKEN_COOKIE => access = Some(value),
				REFRESH_TOKEN_COOKIE => refresh = Some(value),
				_ => {},
			}
		}

		let pair = access.zip(refresh).and_then(|(access, refresh)| {
			TokenPair::builder()
				.access_token(access)
				.refresh_token(refresh)
				.expires_at(observed_at, observed_at)
				.build()
				.ok()
		});
		let mut jar = CookieJar::default();

		if let Some(pair) = pair {
			let (access, refresh) = session_cookies(pair);

			jar.access = Some(access);
			jar.refresh = Some(refresh);
		}

		Self(Arc::new(Mutex::new(jar)))
	}

	/// Drains the `Set-Cookie` header values queued since the previous call.
	pub fn take_set_cookie_headers(&self) -> Vec<String> {
		std::mem::take(&mut self.0.lock().pending)
	}

	/// Returns the cookie with the given name, if present.
	pub fn cookie(&self, name: &str) -> Option<SessionCookie> {
		let jar = self.0.lock();

		[jar.access.as_ref(), jar.refresh.as_ref()]
			.into_iter()
			.flatten()
			.find(|cookie| cookie.name == name)
			.cloned()
	}

	fn save_now(&self, pair: TokenPair) -> Result<(), StoreError> {
		let (access, refresh) = session_cookies(pair);
		let headers = [access.to_set_cookie()?, refresh.to_set_cookie()?];
		let mut jar = self.0.lock();

		jar.pending.extend(headers);
		jar.access = Some(access);
		jar.refresh = Some(refresh);

		Ok(())
	}

	fn load_now(&self) -> Option<TokenPair> {
		let jar = self.0.lock();
		let (access, refresh) = (jar.access.as_ref()?, jar.refresh.as_ref()?);

		Some(TokenPair {
			access_token: access.value.clone(),
			refresh_token: refresh.value.clone(),
			access_expires_at: access.expires,
			refresh_expires_at: refresh.expires,
		})
	}

	fn clear_now(&self) {
		let mut jar = self.0.lock();

		jar.access = None;
		jar.refresh = None;
		jar.pending.push(SessionCookie::removal(ACCESS_TOKEN_COOKIE));
		jar.pending.push(SessionCookie::removal(REFRESH_TOKEN_COOKIE));
	}
}
impl CredentialStore for CookieStore {
	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.save_now(pair) })
	}

	fn load(&self) -> StoreFuture<'_, Option<TokenPair>> {
		Box::pin(async move { Ok(self.load_now()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.clear_now();

			Ok(())
		})
	}
}

fn session_cookies(pair: TokenPair) -> (SessionCookie, SessionCookie) {
	(
		SessionCookie {
			name: ACCESS_TOKEN_COOKIE,
			value: pair.access_token,
			expires: pair.access_expires_at,
		},
		SessionCookie {
			name: REFRESH_TOKEN_COOKIE,
			value: pair.refresh_token,
			expires: pair.refresh_expires_at,
		},
	)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn pair() -> TokenPair {
		TokenPair::builder()
			.access_token("access-cookie")
			.refresh_token("refresh-cookie")
			.issued_at(macros::datetime!(2025-06-24 12:00 UTC))
			.expires_in(Duration::hours(4))
			.build()
			.expect("Token pair fixture should build successfully.")
	}

	#[tokio::test]
	async fn save_queues_secure_cookies_with_independent_expiries() {
		let store = CookieStore::default();

		store.save(pair()).await.expect("Saving into the cookie store should succeed.");

		let headers = store.take_set_cookie_headers();

		assert_eq!(headers.len(), 2);
		assert_eq!(
			headers[0],
			"tiny_access_token=access-cookie; Expires=Tue, 24 Jun 2025 16:00:00 +0000; Path=/; HttpOnly; Secure; SameSite=Lax",
		);
		assert_eq!(
			headers[1],
			"tiny_refresh_token=refresh-cookie; Expires=Wed, 25 Jun 2025 12:00:00 +0000; Path=/; HttpOnly; Secure; SameSite=Lax",
		);
		assert!(store.take_set_cookie_headers().is_empty());

		let loaded = store
			.load()
			.await
			.expect("Loading from the cookie store should succeed.")
			.expect("Cookie store should hold the saved pair.");

		assert_eq!(loaded, pair());
	}

	#[tokio::test]
	async fn clear_removes_both_cookies() {
		let store = CookieStore::default();

		store.save(pair()).await.expect("Saving into the cookie store should succeed.");
		store.take_set_cookie_headers();
		store.clear().await.expect("Clearing the cookie store should succeed.");

		assert!(store.load().await.expect("Load after clear should succeed.").is_none());
		assert!(store.cookie(ACCESS_TOKEN_COOKIE).is_none());
		assert_eq!(
			store.take_set_cookie_headers(),
			vec![
				"tiny_access_token=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax".to_owned(),
				"tiny_refresh_token=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax".to_owned(),
			],
		);
	}

	#[tokio::test]
	async fn request_cookies_rehydrate_the_pair() {
		let before = OffsetDateTime::now_utc();
		let store = CookieStore::from_request_cookies(
			"theme=dark; tiny_access_token=access-cookie; tiny_refresh_token=\"refresh-cookie\"",
		);
		let loaded = store
			.load()
			.await
			.expect("Loading from the cookie store should succeed.")
			.expect("Both request cookies should rehydrate a pair.");

		assert_eq!(loaded.access_token.expose(), "access-cookie");
		assert_eq!(loaded.refresh_token.expose(), "refresh-cookie");
		assert!(loaded.access_expires_at >= before);
		assert!(store.take_set_cookie_headers().is_empty());
	}

	#[tokio::test]
	async fn set_cookie_values_round_trip_through_a_request_header() {
		let origin = CookieStore::default();

		origin.save(pair()).await.expect("Saving into the cookie store should succeed.");

		let header = origin
			.take_set_cookie_headers()
			.iter()
			.filter_map(|value| value.split(';').next())
			.collect::<Vec<_>>()
			.join("; ");
		let loaded = CookieStore::from_request_cookies(&header)
			.load()
			.await
			.expect("Loading from the cookie store should succeed.")
			.expect("The next request should see the saved pair.");

		assert_eq!(loaded.access_token, pair().access_token);
		assert_eq!(loaded.refresh_token, pair().refresh_token);
	}

	#[tokio::test]
	async fn a_single_request_cookie_is_not_a_pair() {
		for header in [
			"tiny_access_token=access-cookie",
			"tiny_refresh_token=refresh-cookie",
			"tiny_access_token=; tiny_refresh_token=refresh-cookie",
			"",
		] {
			let store = CookieStore::from_request_cookies(header);

			assert!(
				store.load().await.expect("Loading should succeed.").is_none(),
				"header {header:?} should not rehydrate a pair"
			);
		}
	}
}
