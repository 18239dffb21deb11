//! Walks through connecting a dashboard backend to Tiny against a local mock: build the authorize
//! URL, exchange the redirect code, then list customers and service orders.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use tiny_erp_broker::{
	config::ClientCredentials,
	flows::TinyClient,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::ProviderDescriptor,
	reqwest::Client,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("code", "demo-code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"token_type\":\"bearer\",\"expires_in\":14400}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/contatos").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[{"id":7,"nome":"Ana","cpf_cnpj":"123","tipo_pessoa":"F","situacao":"A"}]}"#,
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico");
			then.status(200).header("content-type", "application/json").body(r#"[{"id":42}]"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ordem-servico/42");
			then.status(200).header("content-type", "application/json").body(
				r#"{"id":42,"contato":{"id":7,"nome":"Ana"},"data":"2025-06-20","situacao":"6","totalServicos":"120.00"}"#,
			);
		})
		.await;

	let descriptor = ProviderDescriptor::builder()
		.authorization_endpoint(Url::parse(&server.url("/authorize"))?)
		.token_endpoint(Url::parse(&server.url("/token"))?)
		.api_base(Url::parse(&server.url("/api"))?)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let client = <TinyClient<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		store,
		descriptor,
		ClientCredentials::new(
			"demo-client",
			"demo-secret",
			Url::parse("https://dashboard.example.com/api/auth/callback")?,
		),
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	);
	let session = client.start_authentication();

	println!("Send the user to: {}.", session.authorize_url);

	// The redirect handler receives `code` and `state` from Tiny.
	session.validate_state(&session.state)?;
	client.exchange_code_for_token("demo-code").await?;

	token_mock.assert_async().await;

	for customer in client.get_customers().await? {
		println!("Customer {} ({}): {}.", customer.id, customer.cpf_cnpj, customer.nome);
	}
	for order in client.get_service_orders().await? {
		println!(
			"Order {} for {}: {} (R$ {:.2}).",
			order.id, order.cliente_nome, order.situacao, order.valor_mao_de_obra
		);
	}

	Ok(())
}
