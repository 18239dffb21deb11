//! Typed Tiny ERP operations and the mappers that normalize provider records.
//!
//! Raw provider JSON is decoded through `serde_path_to_error`, so a malformed record reports the
//! exact field that failed (`contato.id: invalid type ...`) inside [`Error::Decode`].

pub mod customer;
pub mod service_order;

pub use customer::*;
pub use service_order::*;

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
// self
use crate::{
	_prelude::*,
	flows::{ApiRequest, TinyClient},
	http::HttpTransport,
	oauth::TransportErrorMapper,
};

/// Identifier returned by Tiny after a successful `POST`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
	/// Provider identifier of the new record, normalized to a string.
	#[serde(deserialize_with = "id_string")]
	pub id: String,
}

impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Probes the API with a customer listing to confirm the stored credentials work.
	pub async fn check_connection(&self) -> Result<()> {
		self.get_customers().await.map(|_| ())
	}

	pub(crate) async fn post_record(
		&self,
		endpoint: &'static str,
		body: JsonValue,
	) -> Result<CreatedRecord> {
		let response = self.execute(&ApiRequest::post(endpoint, body)).await?.ok_or_else(|| {
			Error::Decode { what: "created record", message: "empty response body".into() }
		})?;

		decode("created record", response)
	}
}

pub(crate) fn decode<T>(what: &'static str, value: JsonValue) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|e| Error::decode(what, e))
}

/// Accepts numeric or string ids and normalizes them to a string.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	// crates.io
	use serde::de::Error as _;

	match JsonValue::deserialize(deserializer)? {
		JsonValue::Number(number) => Ok(number.to_string()),
		JsonValue::String(text) if !text.trim().is_empty() => Ok(text),
		other => Err(D::Error::custom(format!("expected a numeric or string id, found {other}"))),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn created_record_normalizes_numeric_ids() {
		let record: CreatedRecord = decode("created record", serde_json::json!({ "id": 991 }))
			.expect("Numeric id should decode.");

		assert_eq!(record.id, "991");

		let record: CreatedRecord = decode("created record", serde_json::json!({ "id": "a-12" }))
			.expect("String id should decode.");

		assert_eq!(record.id, "a-12");
	}

	#[test]
	fn decode_errors_carry_the_json_path() {
		let err = decode::<CreatedRecord>("created record", serde_json::json!({ "id": null }))
			.expect_err("Null id should fail.");

		match err {
			Error::Decode { what, message } => {
				assert_eq!(what, "created record");
				assert!(message.starts_with("id"), "unexpected message: {message}");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
