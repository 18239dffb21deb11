//! Token endpoint facade over the `oauth2` crate.
//!
//! Both grants authenticate with `client_id` + `client_secret` in the form body, which is what
//! Tiny's Keycloak realm expects. Responses are mapped into [`TokenPair`] values; any non-2xx
//! answer becomes [`Error::TokenRejected`] carrying the HTTP status and the provider's
//! description so the refresh coordinator can turn it into a session expiry.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{Secret, TokenPair},
	config::ClientCredentials,
	error::{ConfigError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	provider::{GrantType, ProviderDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const UNKNOWN_PROVIDER_ERROR: &str = "unknown error";

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	///
	/// Deadline expiry must map to [`Error::Timeout`] so callers can tell it apart from a
	/// provider failure.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_metadata: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::from(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unrecognized transport failure".into() }.into(),
		}
	}
}

pub(crate) struct TokenFacade<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenFacade<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		credentials: &ClientCredentials,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let invalid = |endpoint: &str| {
			let endpoint = endpoint.to_owned();

			move |source| ConfigError::InvalidUrl { endpoint, source }
		};
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(invalid("authorization"))?;
		let token_url =
			TokenUrl::new(descriptor.endpoints.token.to_string()).map_err(invalid("token"))?;
		let redirect_url = RedirectUrl::new(credentials.redirect_uri.to_string())
			.map_err(invalid("redirect"))?;
		let oauth_client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Exchanges an authorization code for a fresh pair.
	pub(crate) async fn exchange_authorization_code(&self, code: &str) -> Result<TokenPair> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(
					GrantType::AuthorizationCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

		map_token_response(response, None)
	}

	/// Exchanges a refresh token for a fresh pair.
	///
	/// When the provider does not rotate the refresh token, the current one is carried over.
	pub(crate) async fn refresh_token(&self, refresh_token: &Secret) -> Result<TokenPair> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(
					GrantType::RefreshToken,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

		map_token_response(response, Some(refresh_token))
	}
}

fn map_token_response(
	response: BasicTokenResponse,
	current_refresh: Option<&Secret>,
) -> Result<TokenPair> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	let mut builder = TokenPair::builder()
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	match (response.refresh_token(), current_refresh) {
		(Some(rotated), _) => builder = builder.refresh_token(rotated.secret().to_owned()),
		(None, Some(current)) => builder = builder.refresh_token(current.expose()),
		(None, None) => {},
	}

	builder.build().map_err(|e| ConfigError::from(e).into())
}

fn map_request_error<E, M>(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let status = meta.as_ref().and_then(|value| value.status);
	let rejected = |message: String| Error::TokenRejected {
		grant,
		status: status.unwrap_or_default(),
		message,
	};

	match err {
		RequestTokenError::ServerResponse(response) => rejected(server_response_message(&response)),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta.as_ref(), error),
		RequestTokenError::Parse(error, body) =>
			if is_failure(status) {
				rejected(error_body_message(&body))
			} else {
				Error::decode("token response", error)
			},
		RequestTokenError::Other(message) =>
			if is_failure(status) {
				rejected(UNKNOWN_PROVIDER_ERROR.to_owned())
			} else {
				Error::decode("token response", message)
			},
	}
}

fn is_failure(status: Option<u16>) -> bool {
	status.is_some_and(|code| !(200..300).contains(&code))
}

fn server_response_message(response: &BasicErrorResponse) -> String {
	response
		.error_description()
		.cloned()
		.unwrap_or_else(|| response.error().as_ref().to_owned())
}

/// Extracts a human-readable message from a provider error body.
///
/// Looks at `error_description`, `message`, `mensagem`, then `error`.
pub(crate) fn error_body_message(body: &[u8]) -> String {
	serde_json::from_slice::<JsonValue>(body)
		.ok()
		.and_then(|value| {
			["error_description", "message", "mensagem", "error"].into_iter().find_map(|key| {
				value.get(key).and_then(JsonValue::as_str).map(str::to_owned)
			})
		})
		.filter(|message| !message.trim().is_empty())
		.unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.to_owned())
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_timeout() {
		return Error::Timeout;
	}
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::http::ReqwestHttpClient;

	fn credentials() -> ClientCredentials {
		ClientCredentials::new(
			"client-id",
			"client-secret",
			Url::parse("https://dashboard.example.com/api/auth/callback")
				.expect("Failed to parse redirect URI."),
		)
	}

	#[test]
	fn builds_request_body_client_for_tiny() {
		let descriptor =
			ProviderDescriptor::tiny().expect("Built-in Tiny descriptor should be valid.");
		let result = <TokenFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>>::from_descriptor(
			&descriptor,
			&credentials(),
			Arc::new(ReqwestHttpClient::default()),
			Arc::new(ReqwestTransportErrorMapper),
		);

		assert!(result.is_ok());
	}

	#[test]
	fn error_body_message_prefers_description() {
		let body = br#"{"error":"invalid_grant","error_description":"Token is not active"}"#;

		assert_eq!(error_body_message(body), "Token is not active");
		assert_eq!(error_body_message(br#"{"message":"Session not active"}"#), "Session not active");
		assert_eq!(error_body_message(br#"{"mensagem":"Acesso negado"}"#), "Acesso negado");
		assert_eq!(error_body_message(b"<html>bad gateway</html>"), "unknown error");
		assert_eq!(error_body_message(b""), "unknown error");
	}

	#[test]
	fn failure_detection_requires_status() {
		assert!(is_failure(Some(400)));
		assert!(is_failure(Some(503)));
		assert!(!is_failure(Some(200)));
		assert!(!is_failure(None));
	}
}
