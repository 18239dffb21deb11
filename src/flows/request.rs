//! Authorized resource requests with a single retry after a token refresh.
//!
//! Each logical request makes at most two attempts. The first attempt uses whatever access token
//! is stored; a 401 hands control to the refresh coordinator and, once it succeeds, the request
//! is sent again with the token re-read from the store. A second 401 is reported as a provider
//! error rather than triggering another refresh.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	flows::TinyClient,
	http::{HttpTransport, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, flow_event},
};

const JSON_MEDIA_TYPE: &str = "application/json";
const GENERIC_PROVIDER_ERROR: &str = "Não autorizado ou erro no servidor do Tiny";

/// HTTP verbs used against the Tiny resource API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
}
impl ApiMethod {
	fn as_http(self) -> Method {
		match self {
			ApiMethod::Get => Method::GET,
			ApiMethod::Post => Method::POST,
		}
	}
}

/// Resource request relative to the API base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: ApiMethod,
	/// Path appended to the API base, e.g. `/ordem-servico`.
	pub endpoint: String,
	/// Extra path segments appended percent-encoded, e.g. a record id.
	pub segments: Vec<String>,
	/// Optional JSON body.
	pub body: Option<JsonValue>,
}
impl ApiRequest {
	/// Builds a `GET` request without a body.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self { method: ApiMethod::Get, endpoint: endpoint.into(), segments: Vec::new(), body: None }
	}

	/// Builds a `POST` request carrying a JSON body.
	pub fn post(endpoint: impl Into<String>, body: JsonValue) -> Self {
		Self {
			method: ApiMethod::Post,
			endpoint: endpoint.into(),
			segments: Vec::new(),
			body: Some(body),
		}
	}

	/// Appends one path segment; `/`, `?`, and `#` inside it are percent-encoded.
	pub fn segment(mut self, segment: impl Into<String>) -> Self {
		self.segments.push(segment.into());

		self
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
	First,
	AfterRefresh,
}

impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends an authorized request and returns the decoded body.
	///
	/// Returns `Ok(None)` for an empty body. A JSON object whose `data` member is an object or
	/// array is unwrapped to that member; anything else is returned as parsed.
	pub async fn execute(&self, request: &ApiRequest) -> Result<Option<JsonValue>> {
		const KIND: FlowKind = FlowKind::ApiRequest;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute_with_retry(request)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn execute_with_retry(&self, request: &ApiRequest) -> Result<Option<JsonValue>> {
		let url = self
			.descriptor
			.resource_url(&request.endpoint, &request.segments)
			.map_err(|source| ConfigError::InvalidUrl { endpoint: request.endpoint.clone(), source })?;
		let body = match &request.body {
			Some(value) => serde_json::to_vec(value).map_err(|e| Error::decode("request body", e))?,
			None => Vec::new(),
		};
		let mut attempt = Attempt::First;

		loop {
			let pair = self.store.load().await?.ok_or(Error::Unauthenticated)?;
			let response =
				self.send(request.method, &url, &pair.access_token, body.clone()).await?;
			let status = response.status();

			if status.as_u16() == 401 && attempt == Attempt::First {
				flow_event!(
					debug,
					endpoint = %request.endpoint,
					"Access token rejected; refreshing before a single retry."
				);

				self.refresh_access_token().await?;

				attempt = Attempt::AfterRefresh;

				continue;
			}
			if !status.is_success() {
				let message = provider_message(response.body());

				flow_event!(
					warn,
					endpoint = %request.endpoint,
					status = status.as_u16(),
					reason = %message,
					"Tiny API request failed."
				);

				return Err(Error::Provider { status: status.as_u16(), message });
			}

			return decode_body(response.body());
		}
	}

	async fn send(
		&self,
		method: ApiMethod,
		url: &Url,
		access_token: &Secret,
		body: Vec<u8>,
	) -> Result<HttpResponse> {
		let request: HttpRequest = oauth2::http::Request::builder()
			.method(method.as_http())
			.uri(url.as_str())
			.header(AUTHORIZATION, access_token.bearer())
			.header(CONTENT_TYPE, JSON_MEDIA_TYPE)
			.header(ACCEPT, JSON_MEDIA_TYPE)
			.body(body)
			.map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());

		handle
			.call(request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(meta.take().as_ref(), e))
	}
}

fn decode_body(body: &[u8]) -> Result<Option<JsonValue>> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(None);
	}

	let value = serde_json::from_slice::<JsonValue>(body)
		.map_err(|e| Error::decode("response body", e))?;

	Ok(Some(unwrap_envelope(value)))
}

fn unwrap_envelope(value: JsonValue) -> JsonValue {
	match value {
		JsonValue::Object(mut map)
			if map.get("data").is_some_and(|data| data.is_object() || data.is_array()) =>
			map.remove("data").unwrap_or_default(),
		other => other,
	}
}

fn provider_message(body: &[u8]) -> String {
	serde_json::from_slice::<JsonValue>(body)
		.ok()
		.and_then(|value| {
			["mensagem", "message", "error_description"].into_iter().find_map(|key| {
				value.get(key).and_then(JsonValue::as_str).map(str::to_owned)
			})
		})
		.filter(|message| !message.trim().is_empty())
		.unwrap_or_else(|| GENERIC_PROVIDER_ERROR.to_owned())
}
