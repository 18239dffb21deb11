//! Tiny ERP API access layer: OAuth 2.0 token pair storage, single-flight refresh coordination,
//! and retry-once authorized requests behind typed customer and service-order operations.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
#[doc(hidden)]
#[cfg(feature = "reqwest")]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests against `httpmock` servers.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::TokenPair,
		flows::TinyClient,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::ProviderDescriptor,
		store::{CredentialStore, MemoryStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = TinyClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Client identifier used by every test client.
	pub const TEST_CLIENT_ID: &str = "tiny-client-it";
	/// Client secret used by every test client.
	pub const TEST_CLIENT_SECRET: &str = "tiny-secret-it";
	/// Redirect URI used by every test client.
	pub const TEST_REDIRECT_URI: &str = "https://dashboard.example.com/api/auth/callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a descriptor whose endpoints live on a mock server.
	///
	/// `url` maps a path to an absolute URL (typically `|path| server.url(path)`); the token
	/// endpoint is `/token`, the authorize endpoint `/authorize`, and the API base `/api`.
	pub fn test_descriptor(url: impl Fn(&str) -> String) -> ProviderDescriptor {
		let parse = |path: &str| {
			Url::parse(&url(path)).expect("Mock server URL fixture should parse successfully.")
		};

		ProviderDescriptor::builder()
			.authorization_endpoint(parse("/authorize"))
			.token_endpoint(parse("/token"))
			.api_base(parse("/api"))
			.build()
			.expect("Mock provider descriptor should build successfully.")
	}

	/// Constructs a [`TinyClient`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_client(
		descriptor: ProviderDescriptor,
	) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let credentials = crate::config::ClientCredentials::new(
			TEST_CLIENT_ID,
			TEST_CLIENT_SECRET,
			Url::parse(TEST_REDIRECT_URI).expect("Redirect URI fixture should parse successfully."),
		);
		let client = TinyClient::with_http_client(
			store,
			descriptor,
			credentials,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(client, store_backend)
	}

	/// Seeds the store with a token pair issued five minutes ago.
	pub async fn seed_tokens(store: &MemoryStore, access: &str, refresh: &str) {
		let pair = TokenPair::builder()
			.access_token(access)
			.refresh_token(refresh)
			.issued_at(OffsetDateTime::now_utc() - Duration::minutes(5))
			.expires_in(Duration::hours(4))
			.build()
			.expect("Token pair fixture should build successfully.");

		store.save(pair).await.expect("Failed to seed token pair into the store.");
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
