//! Client credentials and runtime settings.
//!
//! [`ClientConfig`] can be deserialized from any serde source or read from the environment via
//! [`ClientConfig::from_env`]:
//!
//! | Variable | Meaning | Default |
//! | --- | --- | --- |
//! | `TINY_CLIENT_ID` | OAuth client identifier | required |
//! | `TINY_CLIENT_SECRET` | OAuth client secret | required |
//! | `TINY_REDIRECT_URI` | Callback registered with Tiny | required |
//! | `TINY_REQUEST_TIMEOUT_SECS` | Deadline applied to every HTTP call | `30` |
//! | `TINY_TOKEN_STORE` | JSON file holding the token pair | in-memory store |

// std
use std::{path::PathBuf, time::Duration as StdDuration};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

const ENV_CLIENT_ID: &str = "TINY_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "TINY_CLIENT_SECRET";
const ENV_REDIRECT_URI: &str = "TINY_REDIRECT_URI";
const ENV_REQUEST_TIMEOUT: &str = "TINY_REQUEST_TIMEOUT_SECS";
const ENV_TOKEN_STORE: &str = "TINY_TOKEN_STORE";

/// OAuth client registration sent with every token endpoint call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: Secret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
}
impl ClientCredentials {
	/// Bundles a client registration.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		redirect_uri: Url,
	) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into(), redirect_uri }
	}
}

/// Full client configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientConfig {
	/// OAuth client registration.
	#[serde(flatten)]
	pub credentials: ClientCredentials,
	/// Deadline applied to every HTTP call, in seconds.
	#[serde(default = "ClientConfig::default_timeout_secs")]
	pub request_timeout_secs: u64,
	/// Optional JSON file persisting the token pair across restarts.
	#[serde(default)]
	pub token_store: Option<PathBuf>,
}
impl ClientConfig {
	/// Deadline used when none is configured.
	pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

	/// Reads the configuration from `TINY_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|var| std::env::var(var).ok())
	}

	/// Reads the configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let required = |var: &'static str| {
			lookup(var)
				.filter(|value| !value.trim().is_empty())
				.ok_or(ConfigError::MissingEnv { var })
		};
		let client_id = required(ENV_CLIENT_ID)?;
		let client_secret = required(ENV_CLIENT_SECRET)?;
		let redirect_uri = Url::parse(&required(ENV_REDIRECT_URI)?).map_err(|e| {
			ConfigError::InvalidEnv { var: ENV_REDIRECT_URI, reason: e.to_string() }
		})?;
		let request_timeout_secs = match lookup(ENV_REQUEST_TIMEOUT) {
			Some(raw) => raw
				.trim()
				.parse::<u64>()
				.ok()
				.filter(|secs| *secs > 0)
				.ok_or_else(|| ConfigError::InvalidEnv {
					var: ENV_REQUEST_TIMEOUT,
					reason: format!("expected a positive number of seconds, got `{raw}`"),
				})?,
			None => Self::DEFAULT_TIMEOUT_SECS,
		};
		let token_store = lookup(ENV_TOKEN_STORE).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

		Ok(Self {
			credentials: ClientCredentials::new(client_id, client_secret, redirect_uri),
			request_timeout_secs,
			token_store,
		})
	}

	/// Deadline applied to every HTTP call.
	pub fn request_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.request_timeout_secs)
	}

	fn default_timeout_secs() -> u64 {
		Self::DEFAULT_TIMEOUT_SECS
	}
}
