// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, provider::ProviderDescriptor};

const STATE_LEN: usize = 32;

/// Authorization redirect metadata returned by [`TinyClient::start_authentication`].
///
/// [`TinyClient::start_authentication`]: crate::flows::TinyClient::start_authentication
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI embedded in the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL the user should be sent to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Validates the `state` parameter returned with the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}
}

pub(super) fn build_session(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &Url,
) -> AuthorizationSession {
	let state = random_state();
	let mut authorize_url = descriptor.endpoints.authorization.clone();

	authorize_url
		.query_pairs_mut()
		.append_pair("client_id", client_id)
		.append_pair("redirect_uri", redirect_uri.as_str())
		.append_pair("scope", &descriptor.scope)
		.append_pair("response_type", "code")
		.append_pair("state", &state);

	AuthorizationSession { state, redirect_uri: redirect_uri.clone(), authorize_url }
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorize_url_carries_client_and_state() {
		let descriptor =
			ProviderDescriptor::tiny().expect("Built-in Tiny descriptor should be valid.");
		let redirect = Url::parse("https://dashboard.example.com/api/auth/callback")
			.expect("Redirect URL fixture should parse successfully.");
		let session = build_session(&descriptor, "tiny-api-client", &redirect);
		let query: HashMap<String, String> = session.authorize_url.query_pairs().into_owned().collect();

		assert!(session.authorize_url.as_str().starts_with(crate::provider::TINY_AUTH_URL));
		assert_eq!(query.get("client_id").map(String::as_str), Some("tiny-api-client"));
		assert_eq!(query.get("redirect_uri").map(String::as_str), Some(redirect.as_str()));
		assert_eq!(query.get("scope").map(String::as_str), Some("openid"));
		assert_eq!(query.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(query.get("state"), Some(&session.state));
		assert_eq!(session.state.len(), STATE_LEN);
	}

	#[test]
	fn state_validation_errors_on_mismatch() {
		let descriptor =
			ProviderDescriptor::tiny().expect("Built-in Tiny descriptor should be valid.");
		let redirect = Url::parse("https://dashboard.example.com/cb")
			.expect("Redirect URL fixture should parse successfully.");
		let session = build_session(&descriptor, "client", &redirect);
		let state = session.state.clone();

		assert!(session.validate_state(&state).is_ok());
		assert!(matches!(session.validate_state("other"), Err(Error::StateMismatch)));
	}
}
