#![cfg(all(feature = "blocking", feature = "reqwest"))]

mod common;

// std
use std::{thread, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use offers_sdk::{Error, Product, uuid::Uuid};

#[test]
fn blocking_client_registers_and_caches_offers() {
	let server = MockServer::start();
	let auth = server.mock(|when, then| {
		when.method(POST).path(AUTH_PATH).header("Bearer", REFRESH_TOKEN);
		then.status(201).json_body(json!({ "access_token": ACCESS_TOKEN }));
	});
	let product = Product::new("Kettle", "1.7 l kettle");
	let product_id = product.id;
	let register = server.mock(|when, then| {
		when.method(POST).path(REGISTER_PATH).header("Bearer", ACCESS_TOKEN);
		then.status(201).json_body(json!({ "id": product_id }));
	});
	let offers = server.mock(|when, then| {
		when.method(GET).path(offers_path(product_id)).header("Bearer", ACCESS_TOKEN);
		then.status(200).json_body(json!([
			{ "id": "6f1c3a52-8d0b-4a43-9f3e-6f8f1b0c2d11", "price": 4990, "items_in_stock": 12 }
		]));
	});
	let client = test_builder(server.base_url())
		.build_blocking()
		.expect("Blocking client should build against the mock server.");

	let registered = client.register_product(&product).expect("Registration should succeed.");

	assert_eq!(registered, product_id);

	let first = client.get_offers(product_id).expect("First lookup should succeed.");
	let second = client.get_offers(product_id).expect("Cached lookup should succeed.");

	assert_eq!(first, second);
	assert_eq!(first[0].items_in_stock(), 12);
	assert_eq!(client.async_client().cache().lookup(product_id), Some(first));

	auth.assert_calls(1);
	register.assert_calls(1);
	offers.assert_calls(1);
}

#[test]
fn threads_share_one_refresh() {
	let server = MockServer::start();
	let auth = server.mock(|when, then| {
		when.method(POST).path(AUTH_PATH);
		then.status(201)
			.delay(StdDuration::from_millis(200))
			.json_body(json!({ "access_token": ACCESS_TOKEN }));
	});
	let client = Arc::new(
		test_builder(server.base_url()).build_blocking().expect("Blocking client should build."),
	);
	let handles = (0..6)
		.map(|_| {
			let client = client.clone();

			thread::spawn(move || client.access_token())
		})
		.collect::<Vec<_>>();

	for handle in handles {
		let token = handle
			.join()
			.expect("Worker thread should not panic.")
			.expect("Shared refresh should succeed.");

		assert_eq!(token.expose(), ACCESS_TOKEN);
	}

	auth.assert_calls(1);
	assert_eq!(client.token_manager().metrics().attempts(), 1);
}

#[test]
fn blocking_and_async_clients_report_the_same_errors() {
	let server = MockServer::start();
	let _auth = server.mock(|when, then| {
		when.method(POST).path(AUTH_PATH);
		then.status(201).json_body(json!({ "access_token": ACCESS_TOKEN }));
	});
	let product_id = Uuid::new_v4();
	let offers = server.mock(|when, then| {
		when.method(GET).path(offers_path(product_id));
		then.status(404);
	});
	let blocking = test_builder(server.base_url())
		.build_blocking()
		.expect("Blocking client should build.")
		.get_offers(product_id)
		.expect_err("Unknown product should fail.");
	let client = test_builder(server.base_url()).build().expect("Async client should build.");
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.expect("Test runtime should start.");
	let asynchronous = runtime
		.block_on(client.get_offers(product_id))
		.expect_err("Unknown product should fail.");

	for err in [blocking, asynchronous] {
		assert!(matches!(err, Error::ProductNotFound { product_id: id } if id == product_id));
	}

	offers.assert_calls(2);
}

#[tokio::test]
async fn last_clone_can_be_dropped_inside_async_code() {
	let client = test_builder("http://127.0.0.1:9")
		.build_blocking()
		.expect("Blocking client should build inside a runtime.");
	let clone = client.clone();

	drop(client);
	drop(clone);
}
