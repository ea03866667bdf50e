//! Registers a product and lists its offers twice with the async client; the second lookup is
//! answered by the offers cache.
//!
//! Runs against a local mock of the offers service.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use offers_sdk::{
	ClientBuilder, Product,
	ext::RequestHook,
	http::{HttpRequest, HttpResponse},
	time::Duration,
};

struct PrintHook;
impl RequestHook for PrintHook {
	fn on_request(&self, request: &HttpRequest) {
		println!("-> {} {}", request.method(), request.uri().path());
	}

	fn on_response(&self, response: &HttpResponse) {
		println!("<- {}", response.status());
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let product = Product::new("Espresso machine", "Dual boiler, 58 mm portafilter.");
	let _auth = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth").header("Bearer", "demo-refresh");
			then.status(201).json_body(json!({ "access_token": "demo-access" }));
		})
		.await;
	let _register = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/products/register");
			then.status(201).json_body(json!({ "id": product.id }));
		})
		.await;
	let offers_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/api/v1/products/{}/offers", product.id));
			then.status(200).json_body(json!([
				{ "id": "6f1c3a52-8d0b-4a43-9f3e-6f8f1b0c2d11", "price": 64900, "items_in_stock": 3 },
				{ "id": "0b7e4a1f-2c3d-4e5f-8a9b-1c2d3e4f5a6b", "price": 61900, "items_in_stock": 0 }
			]));
		})
		.await;
	let client = ClientBuilder::new("demo-refresh")
		.base_url(server.base_url())
		.offers_ttl(Duration::seconds(30))
		.hook(PrintHook)
		.build()?;
	let id = client.register_product(&product).await?;

	println!("registered {id}");

	for round in 1..=2 {
		let offers = client.get_offers(id).await?;

		println!("round {round}: {} offer(s)", offers.len());

		for offer in offers {
			println!("  {} price={} stock={}", offer.id(), offer.price(), offer.items_in_stock());
		}
	}

	offers_mock.assert_calls_async(1).await;

	println!("refreshes: {}", client.token_manager().metrics().attempts());

	Ok(())
}
