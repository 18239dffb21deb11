#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use time::macros::date;
// self
use tiny_erp_broker::{
	_preludet::*,
	api::{CustomerStatus, NewCustomer, NewServiceOrder, PersonKind, ServiceOrderStatus},
};

#[tokio::test]
async fn contacts_are_normalized() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_descriptor(|path| server.url(path)));

	seed_tokens(&store, "access-1", "refresh-1").await;

	let contacts = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/contatos").header("authorization", "Bearer access-1");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[{"id":7,"nome":"Ana","cpf_cnpj":"123","tipo_pessoa":"F","situacao":"A"}]}"#,
			);
		})
		.await;
	let customers = client.get_customers().await.expect("Customer listing should succeed.");

	contacts.assert_calls_async(1).await;

	assert_eq!(customers.len(), 1);
	assert_eq!(customers[0].id, "7");
	assert_eq!(customers[0].tipo_pessoa, PersonKind::Individual);
	assert_eq!(customers[0].situacao, CustomerStatus::Active);
	assert_eq!(
		serde_json::to_value(&customers).expect("Customers should serialize."),
		serde_json::json!([{
			"id": "7",
			"nome": "Ana",
			"cpfCnpj": "123",
			"tipoPessoa": "F",
			"situacao": "A"
		}])
	);

	client.check_connection().await.expect("Connection probe should succeed.");
}

#[tokio::test]
async fn non_array_listing_yields_no_customers() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_descriptor(|path| server.url(path)));

	seed_tokens(&store, "access-1", "refresh-1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/contatos");
			then.status(200).header("content-type", "application/json").body(r#"{"itens":null}"#);
		})
		.await;

	let customers = client.get_customers().await.expect("Customer listing should succeed.");

	assert!(customers.is_empty());
}

#[tokio::test]
async fn empty_order_list_skips_detail_fetches() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_descriptor(|path| server.url(path)));

	seed_tokens(&store, "access-1", "refresh-1").await;

	let listing = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let details = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico/1");
			then.status(200).header("content-type", "application/json").body(r#"{"id":1}"#);
		})
		.await;
	let orders = client.get_service_orders().await.expect("Order listing should succeed.");

	assert!(orders.is_empty());

	listing.assert_calls_async(1).await;
	details.assert_calls_async(0).await;
}

#[tokio::test]
async fn order_details_keep_listing_order() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_descriptor(|path| server.url(path)));

	seed_tokens(&store, "access-1", "refresh-1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"id":11},{"id":"12"},{"id":13}]"#);
		})
		.await;

	for (id, delay_ms, situacao) in [(11, 300, 0), (12, 0, 3), (13, 100, 42)] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(format!("/api/ordem-servico/{id}"));
				then.status(200)
					.header("content-type", "application/json")
					.delay(std::time::Duration::from_millis(delay_ms))
					.body(
						serde_json::json!({
							"id": id,
							"contato": { "id": 7, "nome": "Ana" },
							"data": "2025-06-20",
							"tecnico": "Carla",
							"situacao": situacao.to_string(),
							"totalServicos": "99.90"
						})
						.to_string(),
					);
			})
			.await;
	}

	let orders = client.get_service_orders().await.expect("Order listing should succeed.");
	let ids: Vec<&str> = orders.iter().map(|order| order.id.as_str()).collect();

	assert_eq!(ids, ["11", "12", "13"]);
	assert_eq!(orders[0].situacao, ServiceOrderStatus::EmAberto);
	assert_eq!(orders[1].situacao, ServiceOrderStatus::Concluido);
	assert_eq!(orders[2].situacao, ServiceOrderStatus::Desconhecido);
	assert_eq!(orders[0].equipamento, "Não especificado");
	assert_eq!(orders[0].valor_mao_de_obra, 99.9);
}

#[tokio::test]
async fn failing_detail_fails_the_listing() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_descriptor(|path| server.url(path)));

	seed_tokens(&store, "access-1", "refresh-1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico");
			then.status(200).header("content-type", "application/json").body(r#"[{"id":1},{"id":2}]"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico/1");
			then.status(200).header("content-type", "application/json").body(
				r#"{"id":1,"contato":{"id":7,"nome":"Ana"},"situacao":"0"}"#,
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico/2");
			then.status(500).header("content-type", "application/json").body(r#"{"mensagem":"Falha"}"#);
		})
		.await;

	let err = client.get_service_orders().await.expect_err("A failing detail should fail the call.");

	assert!(matches!(err, Error::Provider { status: 500, .. }));
	assert!(err.is_transient());
}

#[tokio::test]
async fn posts_customer_and_service_order() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_descriptor(|path| server.url(path)));

	seed_tokens(&store, "access-1", "refresh-1").await;

	let contact = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/contatos").json_body(serde_json::json!({
				"contato": {
					"nome": "Oficina Central",
					"tipo_pessoa": "J",
					"cpf_cnpj": "12345678000199",
					"email": "contato@oficina.com.br"
				}
			}));
			then.status(200).header("content-type", "application/json").body(r#"{"data":{"id":501}}"#);
		})
		.await;
	let order = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/ordem-servico").json_body(serde_json::json!({
				"cliente": { "id": 501 },
				"tecnico": "Carla",
				"dataInicio": "2025-06-24",
				"dataPrevista": "2025-06-30",
				"descricao": "Tela quebrada",
				"assistenciaTecnica": { "equipamento": "Equipamento Padrão" },
				"servicos": []
			}));
			then.status(200).header("content-type", "application/json").body(r#"{"id":"9001"}"#);
		})
		.await;
	let created = client
		.post_customer(&NewCustomer {
			nome: "Oficina Central".into(),
			tipo_pessoa: PersonKind::Company,
			cpf_cnpj: "12345678000199".into(),
			email: "contato@oficina.com.br".into(),
		})
		.await
		.expect("Customer creation should succeed.");

	assert_eq!(created.id, "501");

	let created = client
		.post_service_order(&NewServiceOrder {
			cliente_id: 501,
			tecnico: "Carla".into(),
			data_inicio: date!(2025 - 06 - 24),
			data_prevista: date!(2025 - 06 - 30),
			descricao: "Tela quebrada".into(),
		})
		.await
		.expect("Service order creation should succeed.");

	assert_eq!(created.id, "9001");

	contact.assert_calls_async(1).await;
	order.assert_calls_async(1).await;
}
