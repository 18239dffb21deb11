//! Provider descriptor for the Tiny ERP realm.
//!
//! [`ProviderDescriptor`] holds the validated HTTPS endpoints the client talks to: the
//! authorization endpoint users are redirected to, the token endpoint used for code exchanges
//! and refreshes, and the base URL of the resource API. [`ProviderDescriptor::tiny`] returns the
//! production endpoints.

pub mod builder;
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::_prelude::*;

/// Production authorization endpoint.
pub const TINY_AUTH_URL: &str =
	"https://accounts.tiny.com.br/realms/tiny/protocol/openid-connect/auth";
/// Production token endpoint.
pub const TINY_TOKEN_URL: &str =
	"https://accounts.tiny.com.br/realms/tiny/protocol/openid-connect/token";
/// Production resource API base.
pub const TINY_API_BASE_URL: &str = "https://api.tiny.com.br/public-api/v3";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Base URL resource paths (`/contatos`, `/ordem-servico`) are appended to.
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scope requested on the authorize URL.
	pub scope: String,
}
impl ProviderDescriptor {
	/// Scope requested when none is configured.
	pub const DEFAULT_SCOPE: &'static str = "openid";

	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::default()
	}

	/// Returns the descriptor for Tiny's production realm and API.
	pub fn tiny() -> Result<Self, ProviderDescriptorError> {
		let parse = |endpoint: &'static str, raw: &str| {
			Url::parse(raw).map_err(|source| ProviderDescriptorError::InvalidUrl {
				endpoint,
				url: raw.to_owned(),
				reason: source.to_string(),
			})
		};

		Self::builder()
			.authorization_endpoint(parse("authorization", TINY_AUTH_URL)?)
			.token_endpoint(parse("token", TINY_TOKEN_URL)?)
			.api_base(parse("api", TINY_API_BASE_URL)?)
			.build()
	}

	/// Joins a resource path such as `/ordem-servico` onto the API base, then appends each of
	/// `segments` as one percent-encoded path segment.
	///
	/// The path is appended verbatim so the base's own path segments (`/public-api/v3`) stay in
	/// place. Segments never introduce extra path levels, a query, or a fragment.
	pub fn resource_url<I>(&self, endpoint: &str, segments: I) -> Result<Url, url::ParseError>
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let base = self.endpoints.api_base.as_str().trim_end_matches('/');
		let path = endpoint.trim_start_matches('/');
		let mut url = Url::parse(&format!("{base}/{path}"))?;

		url.path_segments_mut()
			.map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
			.extend(segments);

		Ok(url)
	}
}
