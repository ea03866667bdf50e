//! Plugs an in-memory transport into the client; no HTTP stack is involved.

// std
use std::{convert::Infallible, sync::Arc};
// crates.io
use color_eyre::Result;
use serde_json::json;
// self
use offers_sdk::{
	ClientBuilder, Error,
	error::TransientError,
	http::{
		HttpClientError, HttpRequest, HttpResponse, HttpTransport, Method, StatusCode,
		TransportErrorMapper, TransportFuture,
	},
	uuid::Uuid,
};

/// Answers every call locally: tokens are always issued and every product has one offer.
struct InMemoryService;
impl HttpTransport for InMemoryService {
	type TransportError = Infallible;

	fn send(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let path = request.uri().path().to_owned();
		let method = request.method();
		let (status, body) = match path.as_str() {
			"/api/v1/auth" if method == Method::POST =>
				(StatusCode::CREATED, json!({ "access_token": "in-memory" })),
			p if method == Method::GET && p.ends_with("/offers") => (
				StatusCode::OK,
				json!([{ "id": Uuid::new_v4(), "price": 1000, "items_in_stock": 7 }]),
			),
			_ => (StatusCode::NOT_FOUND, json!({ "detail": "Not found" })),
		};

		Box::pin(async move {
			let mut response = HttpResponse::new(body.to_string().into_bytes());

			*response.status_mut() = status;

			Ok(response)
		})
	}
}

struct InMemoryMapper;
impl TransportErrorMapper<Infallible> for InMemoryMapper {
	fn map_transport_error(&self, error: HttpClientError<Infallible>) -> Error {
		TransientError::transport(error.to_string()).into()
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client = ClientBuilder::new("unused-refresh-token")
		.base_url("http://in-memory.invalid")
		.build_with_transport(Arc::new(InMemoryService), Arc::new(InMemoryMapper))?;
	let offers = client.get_offers(Uuid::new_v4()).await?;

	println!("{} offer(s) served in memory", offers.len());

	Ok(())
}
