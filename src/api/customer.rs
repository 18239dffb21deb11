//! Customers (`/contatos`).

// self
use crate::{
	_prelude::*,
	api::{self, CreatedRecord},
	flows::{ApiRequest, TinyClient},
	http::HttpTransport,
	oauth::TransportErrorMapper,
};

const CONTACTS_ENDPOINT: &str = "/contatos";

/// Legal person kind (`tipo_pessoa`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersonKind {
	/// `F`: individual (pessoa física).
	Individual,
	/// `J`: company (pessoa jurídica).
	Company,
	/// Any other code Tiny returns, preserved verbatim.
	Other(String),
}
impl From<String> for PersonKind {
	fn from(code: String) -> Self {
		match code.as_str() {
			"F" => Self::Individual,
			"J" => Self::Company,
			_ => Self::Other(code),
		}
	}
}
impl From<PersonKind> for String {
	fn from(kind: PersonKind) -> Self {
		match kind {
			PersonKind::Individual => "F".into(),
			PersonKind::Company => "J".into(),
			PersonKind::Other(code) => code,
		}
	}
}

/// Registration status (`situacao`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomerStatus {
	/// `A`: active.
	Active,
	/// `I`: inactive.
	Inactive,
	/// Any other code Tiny returns, preserved verbatim.
	Other(String),
}
impl From<String> for CustomerStatus {
	fn from(code: String) -> Self {
		match code.as_str() {
			"A" => Self::Active,
			"I" => Self::Inactive,
			_ => Self::Other(code),
		}
	}
}
impl From<CustomerStatus> for String {
	fn from(status: CustomerStatus) -> Self {
		match status {
			CustomerStatus::Active => "A".into(),
			CustomerStatus::Inactive => "I".into(),
			CustomerStatus::Other(code) => code,
		}
	}
}

/// Normalized customer read model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
	/// Provider identifier, normalized to a string.
	pub id: String,
	/// Display name.
	pub nome: String,
	/// CPF or CNPJ document number.
	pub cpf_cnpj: String,
	/// Legal person kind.
	pub tipo_pessoa: PersonKind,
	/// Registration status.
	pub situacao: CustomerStatus,
}

/// Customer to create through [`TinyClient::post_customer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
	/// Display name.
	pub nome: String,
	/// Legal person kind.
	pub tipo_pessoa: PersonKind,
	/// CPF or CNPJ document number.
	pub cpf_cnpj: String,
	/// Contact e-mail.
	pub email: String,
}

#[derive(Deserialize)]
struct RawCustomer {
	#[serde(deserialize_with = "api::id_string")]
	id: String,
	#[serde(default)]
	nome: String,
	#[serde(default)]
	cpf_cnpj: String,
	#[serde(default)]
	tipo_pessoa: String,
	#[serde(default)]
	situacao: String,
}

#[derive(Serialize)]
struct ContactPayload<'a> {
	nome: &'a str,
	tipo_pessoa: String,
	cpf_cnpj: &'a str,
	email: &'a str,
}

/// Maps one raw `/contatos` record into a [`Customer`].
pub fn map_customer(raw: JsonValue) -> Result<Customer> {
	let raw: RawCustomer = api::decode("customer", raw)?;

	Ok(Customer {
		id: raw.id,
		nome: raw.nome,
		cpf_cnpj: raw.cpf_cnpj,
		tipo_pessoa: raw.tipo_pessoa.into(),
		situacao: raw.situacao.into(),
	})
}

impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists customers; anything other than a JSON array yields an empty list.
	pub async fn get_customers(&self) -> Result<Vec<Customer>> {
		match self.execute(&ApiRequest::get(CONTACTS_ENDPOINT)).await? {
			Some(JsonValue::Array(items)) => items.into_iter().map(map_customer).collect(),
			_ => Ok(Vec::new()),
		}
	}

	/// Creates a customer and returns its provider id.
	pub async fn post_customer(&self, customer: &NewCustomer) -> Result<CreatedRecord> {
		let payload = ContactPayload {
			nome: &customer.nome,
			tipo_pessoa: customer.tipo_pessoa.clone().into(),
			cpf_cnpj: &customer.cpf_cnpj,
			email: &customer.email,
		};
		let body = serde_json::to_value(&payload).map_err(|e| Error::decode("customer payload", e))?;

		self.post_record(CONTACTS_ENDPOINT, serde_json::json!({ "contato": body })).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn maps_contact_into_camel_case_customer() {
		let customer = map_customer(serde_json::json!({
			"id": 7,
			"nome": "Ana",
			"cpf_cnpj": "123",
			"tipo_pessoa": "F",
			"situacao": "A"
		}))
		.expect("Contact should map.");

		assert_eq!(customer.id, "7");
		assert_eq!(customer.tipo_pessoa, PersonKind::Individual);
		assert_eq!(customer.situacao, CustomerStatus::Active);
		assert_eq!(
			serde_json::to_value(&customer).expect("Customer should serialize."),
			serde_json::json!({
				"id": "7",
				"nome": "Ana",
				"cpfCnpj": "123",
				"tipoPessoa": "F",
				"situacao": "A"
			})
		);
	}

	#[test]
	fn unknown_codes_are_preserved() {
		let customer = map_customer(serde_json::json!({
			"id": "c-1",
			"nome": "Oficina",
			"tipo_pessoa": "E",
			"situacao": "S"
		}))
		.expect("Contact should map.");

		assert_eq!(customer.tipo_pessoa, PersonKind::Other("E".into()));
		assert_eq!(customer.situacao, CustomerStatus::Other("S".into()));
		assert_eq!(customer.cpf_cnpj, "");
	}

	#[test]
	fn missing_id_is_a_decode_error() {
		let err = map_customer(serde_json::json!({ "nome": "Ana" }))
			.expect_err("A contact without id should fail.");

		assert!(matches!(err, Error::Decode { what: "customer", .. }));
	}
}
