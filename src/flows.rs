//! Client orchestrating token exchanges, refreshes, and authorized requests.

pub mod authorization;
pub mod refresh;
pub mod request;

pub use authorization::*;
pub use refresh::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	config::ClientCredentials,
	http::HttpTransport,
	oauth::{TokenFacade, TransportErrorMapper},
	provider::ProviderDescriptor,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{
	config::ClientConfig,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	store::{FileStore, MemoryStore},
};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestTinyClient = TinyClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authenticated access to the Tiny ERP API.
///
/// The client owns the HTTP transport, credential store, provider descriptor, and client
/// registration. Clones share the same refresh coordinator, so concurrent callers on any clone
/// converge on a single token-endpoint call when the access token is rejected.
pub struct TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Store holding the current token pair.
	pub store: Arc<dyn CredentialStore>,
	/// Provider descriptor that defines the OAuth and API endpoints.
	pub descriptor: ProviderDescriptor,
	/// OAuth client registration.
	pub credentials: ClientCredentials,
	/// Shared counters for refresh network calls.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh: Arc<RefreshCoordinator>,
	write_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		credentials: ClientCredentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			credentials,
			refresh_metrics: Default::default(),
			refresh: Default::default(),
			write_guard: Default::default(),
		}
	}

	fn token_facade(&self) -> Result<TokenFacade<C, M>> {
		TokenFacade::from_descriptor(
			&self.descriptor,
			&self.credentials,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl TinyClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client with its own reqwest transport.
	///
	/// The transport never follows redirects and applies no deadline; use
	/// [`TinyClient::from_config`] to get the configured request timeout.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		credentials: ClientCredentials,
	) -> Self {
		Self::with_http_client(
			store,
			descriptor,
			credentials,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	/// Builds a production client from [`ClientConfig`].
	///
	/// Uses [`FileStore`] when `token_store` is set and [`MemoryStore`] otherwise.
	pub fn from_config(config: ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout())?;
		let store: Arc<dyn CredentialStore> = match &config.token_store {
			Some(path) => Arc::new(FileStore::open(path.clone())?),
			None => Arc::new(MemoryStore::default()),
		};
		let descriptor = ProviderDescriptor::tiny().map_err(crate::error::ConfigError::from)?;

		Ok(Self::with_http_client(
			store,
			descriptor,
			config.credentials,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			credentials: self.credentials.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh: self.refresh.clone(),
			write_guard: self.write_guard.clone(),
		}
	}
}
impl<C, M> Debug for TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TinyClient")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.credentials.client_id)
			.field("redirect_uri", &self.credentials.redirect_uri.as_str())
			.finish()
	}
}
