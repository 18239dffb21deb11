//! Crate-level error types shared by the store, token endpoint facade, and request executor.
//!
//! [`Error`] is `Clone` so every caller attached to a shared refresh observes the same failure.

// self
use crate::{_prelude::*, provider::GrantType};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No credentials are stored; the user must restart the authorization flow.
	#[error(
		"Not authorized: no Tiny access token is stored. Reconnect through the authorization flow."
	)]
	Unauthenticated,
	/// A refresh was requested but no refresh token is stored.
	#[error("No Tiny refresh token is stored; a new authorization is required.")]
	NoRefreshToken,
	/// The token endpoint rejected the refresh grant; stored credentials were cleared.
	#[error(
		"Session expired: Tiny rejected the token refresh (HTTP {status}): {message}. Reconnect through the authorization flow."
	)]
	SessionExpired {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Provider-supplied description, or a generic message.
		message: String,
	},
	/// The `state` returned by the authorization redirect does not match the session.
	#[error("Authorization state mismatch; restart the authorization flow.")]
	StateMismatch,
	/// The token endpoint rejected an authorization code exchange.
	#[error("Tiny rejected the {grant} grant (HTTP {status}): {message}.")]
	TokenRejected {
		/// Grant that was rejected.
		grant: GrantType,
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Provider-supplied description, or a generic message.
		message: String,
	},
	/// A resource endpoint answered with a non-success status.
	#[error("Tiny API error ({status}): {message}.")]
	Provider {
		/// HTTP status returned by the resource endpoint.
		status: u16,
		/// Provider-supplied message, or a generic message.
		message: String,
	},
	/// The request exceeded the configured deadline.
	#[error("Request to Tiny timed out; try again later.")]
	Timeout,
	/// A response body could not be decoded into the expected shape.
	#[error("Tiny returned a malformed {what} payload: {message}.")]
	Decode {
		/// Payload kind (token response, customer, service order, ...).
		what: &'static str,
		/// Parser message, including the JSON path when available.
		message: String,
	},
}
impl Error {
	/// Returns `true` when the user has to go through the authorization flow again.
	pub fn requires_reauthentication(&self) -> bool {
		matches!(
			self,
			Self::Unauthenticated
				| Self::NoRefreshToken
				| Self::SessionExpired { .. }
				| Self::StateMismatch
		)
	}

	/// Returns `true` for failures a caller may retry later (timeouts, network, 5xx).
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Timeout | Self::Transport(_) => true,
			Self::Provider { status, .. } => *status >= 500,
			_ => false,
		}
	}

	pub(crate) fn decode(what: &'static str, err: impl Display) -> Self {
		Self::Decode { what, message: err.to_string() }
	}
}

/// Configuration and validation failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed.")]
	HttpRequest {
		/// Underlying request builder failure.
		#[source]
		source: Arc<oauth2::http::Error>,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Endpoint URL cannot be parsed.
	#[error("The {endpoint} URL is invalid.")]
	InvalidUrl {
		/// Which URL failed to parse.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Required environment variable is missing.
	#[error("Environment variable `{var}` is not set.")]
	MissingEnv {
		/// Variable name.
		var: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{var}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		var: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Token pair builder validation failed.
	#[error("Unable to build token pair.")]
	TokenBuild(#[from] crate::auth::TokenPairBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling Tiny.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling Tiny.")]
	Io(#[source] Arc<std::io::Error>),
	/// Transport reported a failure without a structured error.
	#[error("HTTP client error occurred while calling Tiny: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io(Arc::new(e))
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
