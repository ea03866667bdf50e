//! Registers a product from several threads sharing one blocking client.
//!
//! Set `OFFERS_SDK_REFRESH_TOKEN` (and optionally `OFFERS_SDK_BASE_URL`) to talk to a real
//! deployment; otherwise a local mock is started.

// std
use std::{sync::Arc, thread};
// crates.io
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
use serde_json::json;
// self
use offers_sdk::{ClientBuilder, Error, Product, client::REFRESH_TOKEN_ENV};

fn main() -> Result<()> {
	color_eyre::install()?;

	let mock = std::env::var(REFRESH_TOKEN_ENV).is_err().then(|| {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(POST).path("/api/v1/auth");
			then.status(201).json_body(json!({ "access_token": "demo-access" }));
		});
		server.mock(|when, then| {
			when.method(POST).path("/api/v1/products/register");
			then.status(409).json_body(json!({ "detail": "Product already registered" }));
		});

		server
	});
	let builder = match &mock {
		Some(server) => ClientBuilder::new("demo-refresh").base_url(server.base_url()),
		None => ClientBuilder::from_env()?,
	};
	let client = Arc::new(builder.build_blocking()?);
	let handles = (0..3)
		.map(|n| {
			let client = client.clone();

			thread::spawn(move || {
				let product = Product::new(format!("Demo product {n}"), "Registered by a worker.");

				match client.register_product(&product) {
					Ok(id) => println!("worker {n}: registered {id}"),
					Err(Error::ProductAlreadyExists { product_id }) =>
						println!("worker {n}: {product_id} already exists"),
					Err(e) => println!("worker {n}: {e}"),
				}
			})
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.join().map_err(|_| eyre!("worker thread panicked"))?;
	}

	println!("refreshes: {}", client.token_manager().metrics().attempts());

	Ok(())
}
