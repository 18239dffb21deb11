//! Service orders (`/ordem-servico`).

// crates.io
use futures::future;
use time::Date;
// self
use crate::{
	_prelude::*,
	api::{self, CreatedRecord},
	flows::{ApiRequest, TinyClient},
	http::HttpTransport,
	oauth::TransportErrorMapper,
};

const ORDERS_ENDPOINT: &str = "/ordem-servico";
const DEFAULT_EQUIPMENT: &str = "Não especificado";
const DEFAULT_TECHNICIAN: &str = "Não atribuído";
const PLACEHOLDER_EQUIPMENT: &str = "Equipamento Padrão";

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Order status derived from Tiny's numeric `situacao` code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceOrderStatus {
	/// Code `0`.
	#[serde(rename = "Em Aberto")]
	EmAberto,
	/// Code `1`.
	#[serde(rename = "Orçada")]
	Orcada,
	/// Codes `2` and `3` (finished).
	#[serde(rename = "Concluído")]
	Concluido,
	/// Code `4`.
	#[serde(rename = "Não Aprovada")]
	NaoAprovada,
	/// Code `5`.
	#[serde(rename = "Aprovada")]
	Aprovada,
	/// Code `6`.
	#[serde(rename = "Em Andamento")]
	EmAndamento,
	/// Code `7`.
	#[serde(rename = "Cancelada")]
	Cancelada,
	/// Any code outside the table.
	#[serde(rename = "Desconhecido")]
	Desconhecido,
}
impl ServiceOrderStatus {
	/// Looks up a provider status code; unknown codes map to [`ServiceOrderStatus::Desconhecido`].
	pub fn from_code(code: &str) -> Self {
		match code.trim() {
			"0" => Self::EmAberto,
			"1" => Self::Orcada,
			"2" | "3" => Self::Concluido,
			"4" => Self::NaoAprovada,
			"5" => Self::Aprovada,
			"6" => Self::EmAndamento,
			"7" => Self::Cancelada,
			_ => Self::Desconhecido,
		}
	}

	/// Returns the Portuguese label shown to users.
	pub const fn label(self) -> &'static str {
		match self {
			Self::EmAberto => "Em Aberto",
			Self::Orcada => "Orçada",
			Self::Concluido => "Concluído",
			Self::NaoAprovada => "Não Aprovada",
			Self::Aprovada => "Aprovada",
			Self::EmAndamento => "Em Andamento",
			Self::Cancelada => "Cancelada",
			Self::Desconhecido => "Desconhecido",
		}
	}

	fn from_json(code: &JsonValue) -> Self {
		match code {
			JsonValue::String(code) => Self::from_code(code),
			JsonValue::Number(code) => Self::from_code(&code.to_string()),
			_ => Self::Desconhecido,
		}
	}
}
impl Display for ServiceOrderStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// Normalized service order read model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
	/// Provider identifier, normalized to a string.
	pub id: String,
	/// Customer identifier, normalized to a string.
	pub cliente_id: String,
	/// Customer display name.
	pub cliente_nome: String,
	/// Order date as returned by Tiny.
	pub data: String,
	/// Equipment under service.
	pub equipamento: String,
	/// Assigned technician.
	pub tecnico: String,
	/// Order status.
	pub situacao: ServiceOrderStatus,
	/// Labor total (`totalServicos`).
	pub valor_mao_de_obra: f64,
}

/// Service order to create through [`TinyClient::post_service_order`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceOrder {
	/// Tiny customer id.
	pub cliente_id: u64,
	/// Assigned technician.
	pub tecnico: String,
	/// Start date.
	#[serde(with = "iso_date")]
	pub data_inicio: Date,
	/// Expected completion date.
	#[serde(with = "iso_date")]
	pub data_prevista: Date,
	/// Problem description.
	pub descricao: String,
}

#[derive(Deserialize)]
struct RawServiceOrder {
	#[serde(deserialize_with = "api::id_string")]
	id: String,
	contato: RawOrderContact,
	#[serde(default)]
	data: Option<String>,
	#[serde(default)]
	equipamento: Option<String>,
	#[serde(default)]
	tecnico: Option<String>,
	#[serde(default)]
	situacao: JsonValue,
	#[serde(default, rename = "totalServicos")]
	total_servicos: JsonValue,
}

#[derive(Deserialize)]
struct RawOrderContact {
	#[serde(deserialize_with = "api::id_string")]
	id: String,
	#[serde(default)]
	nome: String,
}

#[derive(Deserialize)]
struct RawOrderRef {
	#[serde(deserialize_with = "api::id_string")]
	id: String,
}

/// Maps one raw `/ordem-servico/{id}` record into a [`ServiceOrder`].
pub fn map_service_order(raw: JsonValue) -> Result<ServiceOrder> {
	let raw: RawServiceOrder = api::decode("service order", raw)?;

	Ok(ServiceOrder {
		id: raw.id,
		cliente_id: raw.contato.id,
		cliente_nome: raw.contato.nome,
		data: raw.data.unwrap_or_default(),
		equipamento: non_blank_or(raw.equipamento, DEFAULT_EQUIPMENT),
		tecnico: non_blank_or(raw.tecnico, DEFAULT_TECHNICIAN),
		situacao: ServiceOrderStatus::from_json(&raw.situacao),
		valor_mao_de_obra: parse_amount(&raw.total_servicos),
	})
}

fn detail_request(id: &str) -> ApiRequest {
	ApiRequest::get(ORDERS_ENDPOINT).segment(id)
}

fn non_blank_or(value: Option<String>, fallback: &str) -> String {
	value.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| fallback.to_owned())
}

fn parse_amount(value: &JsonValue) -> f64 {
	match value {
		JsonValue::Number(number) => number.as_f64().unwrap_or_default(),
		JsonValue::String(text) => text.trim().parse().unwrap_or_default(),
		_ => 0.0,
	}
}

impl<C, M> TinyClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches and maps one service order.
	pub async fn get_service_order_details(&self, id: &str) -> Result<ServiceOrder> {
		let raw = self.execute(&detail_request(id)).await?.ok_or_else(|| {
			Error::Decode { what: "service order", message: "empty response body".into() }
		})?;

		map_service_order(raw)
	}

	/// Lists service orders with their details.
	///
	/// Details are fetched concurrently, one request per listed id, and returned in list order.
	/// An empty or non-array listing returns an empty vector without fetching details; the first
	/// failing detail fetch fails the whole call.
	pub async fn get_service_orders(&self) -> Result<Vec<ServiceOrder>> {
		let listing = match self.execute(&ApiRequest::get(ORDERS_ENDPOINT)).await? {
			Some(JsonValue::Array(items)) => items,
			_ => return Ok(Vec::new()),
		};

		if listing.is_empty() {
			return Ok(Vec::new());
		}

		let ids = listing
			.into_iter()
			.map(|item| api::decode::<RawOrderRef>("service order listing", item).map(|r| r.id))
			.collect::<Result<Vec<_>>>()?;

		future::try_join_all(ids.iter().map(|id| self.get_service_order_details(id))).await
	}

	/// Creates a service order and returns its provider id.
	pub async fn post_service_order(&self, order: &NewServiceOrder) -> Result<CreatedRecord> {
		let iso = |date: &Date| {
			iso_date::serialize(date, serde_json::value::Serializer)
				.map_err(|e| Error::decode("service order payload", e))
		};
		let data_inicio = iso(&order.data_inicio)?;
		let data_prevista = iso(&order.data_prevista)?;
		let body = serde_json::json!({
			"cliente": { "id": order.cliente_id },
			"tecnico": order.tecnico,
			"dataInicio": data_inicio,
			"dataPrevista": data_prevista,
			"descricao": order.descricao,
			"assistenciaTecnica": { "equipamento": PLACEHOLDER_EQUIPMENT },
			"servicos": [],
		});

		self.post_record(ORDERS_ENDPOINT, body).await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::date;
	// self
	use super::*;

	#[test]
	fn status_table_covers_every_code() {
		let table = [
			("0", "Em Aberto"),
			("1", "Orçada"),
			("2", "Concluído"),
			("3", "Concluído"),
			("4", "Não Aprovada"),
			("5", "Aprovada"),
			("6", "Em Andamento"),
			("7", "Cancelada"),
			("8", "Desconhecido"),
			("", "Desconhecido"),
		];

		for (code, label) in table {
			assert_eq!(ServiceOrderStatus::from_code(code).label(), label, "code {code:?}");
		}

		assert_eq!(ServiceOrderStatus::from_json(&serde_json::json!(5)), ServiceOrderStatus::Aprovada);
		assert_eq!(ServiceOrderStatus::from_json(&JsonValue::Null), ServiceOrderStatus::Desconhecido);
	}

	#[test]
	fn maps_detail_with_defaults() {
		let order = map_service_order(serde_json::json!({
			"id": 42,
			"contato": { "id": 7, "nome": "Ana" },
			"data": "2025-06-20",
			"equipamento": "",
			"situacao": "6",
			"totalServicos": "150.50"
		}))
		.expect("Order should map.");

		assert_eq!(order.id, "42");
		assert_eq!(order.cliente_id, "7");
		assert_eq!(order.cliente_nome, "Ana");
		assert_eq!(order.equipamento, "Não especificado");
		assert_eq!(order.tecnico, "Não atribuído");
		assert_eq!(order.situacao, ServiceOrderStatus::EmAndamento);
		assert_eq!(order.valor_mao_de_obra, 150.5);
	}

	#[test]
	fn serializes_status_labels_and_camel_case() {
		let order = map_service_order(serde_json::json!({
			"id": "9",
			"contato": { "id": "3", "nome": "Bruno" },
			"tecnico": "Carla",
			"situacao": 99,
			"totalServicos": 80
		}))
		.expect("Order should map.");
		let value = serde_json::to_value(&order).expect("Order should serialize.");

		assert_eq!(value["situacao"], "Desconhecido");
		assert_eq!(value["clienteNome"], "Bruno");
		assert_eq!(value["valorMaoDeObra"], 80.0);
		assert_eq!(value["data"], "");
	}

	#[test]
	fn missing_contact_reports_path() {
		let err = map_service_order(serde_json::json!({ "id": 1, "contato": { "nome": "X" } }))
			.expect_err("An order without contact id should fail.");

		match err {
			Error::Decode { what, message } => {
				assert_eq!(what, "service order");
				assert!(message.contains("contato"), "unexpected message: {message}");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn detail_request_keeps_the_id_in_one_segment() {
		let descriptor = crate::provider::ProviderDescriptor::tiny()
			.expect("Built-in Tiny descriptor should be valid.");
		let request = detail_request("7?situacao=1");
		let url = descriptor
			.resource_url(&request.endpoint, &request.segments)
			.expect("Detail URL should build.");

		assert_eq!(url.path(), "/public-api/v3/ordem-servico/7%3Fsituacao=1");
		assert_eq!(url.query(), None);
	}

	#[test]
	fn new_order_dates_use_iso_format() {
		let order: NewServiceOrder = serde_json::from_value(serde_json::json!({
			"clienteId": 7,
			"tecnico": "Carla",
			"dataInicio": "2025-06-24",
			"dataPrevista": "2025-06-30",
			"descricao": "Tela quebrada"
		}))
		.expect("New order should deserialize.");

		assert_eq!(order.data_inicio, date!(2025 - 06 - 24));
		assert_eq!(order.data_prevista, date!(2025 - 06 - 30));
	}
}
