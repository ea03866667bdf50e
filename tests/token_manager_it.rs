#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use offers_sdk::{Error, ReqwestOffersClient, auth::SERVER_TOKEN_LIFETIME, error::TransientError};

fn build_client(server: &MockServer) -> ReqwestOffersClient {
	test_builder(server.base_url()).build().expect("Client should build against the mock server.")
}

#[tokio::test]
async fn concurrent_get_token_refreshes_once() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH).header("Bearer", REFRESH_TOKEN);
			then.status(201)
				.delay(StdDuration::from_millis(200))
				.json_body(json!({ "access_token": ACCESS_TOKEN }));
		})
		.await;
	let client = build_client(&server);
	let handles = (0..8)
		.map(|_| {
			let tokens = client.token_manager().clone();

			tokio::spawn(async move { tokens.get_token().await })
		})
		.collect::<Vec<_>>();
	let mut tokens = Vec::new();

	for handle in handles {
		tokens.push(
			handle.await.expect("Task should not panic.").expect("Shared refresh should succeed."),
		);
	}

	assert!(tokens.iter().all(|token| token == &tokens[0]));
	assert_eq!(tokens[0].expose(), ACCESS_TOKEN);
	assert_eq!(tokens[0].expires_at() - tokens[0].issued_at(), SERVER_TOKEN_LIFETIME);

	mock.assert_calls_async(1).await;

	// A valid cached token never reaches the network.
	client.token_manager().get_token().await.expect("Cached token should be returned.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_waiters_share_refresh_error_without_caching_it() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH);
			then.status(401)
				.delay(StdDuration::from_millis(200))
				.json_body(json!({ "detail": "Invalid refresh token" }));
		})
		.await;
	let client = build_client(&server);
	let tokens = client.token_manager();
	let (first, second, third) =
		tokio::join!(tokens.get_token(), tokens.get_token(), tokens.force_refresh());

	for result in [first, second, third] {
		assert!(matches!(
			result,
			Err(Error::Authentication { ref reason }) if reason == "Invalid refresh token"
		));
	}

	mock.assert_calls_async(1).await;

	let retried = tokens.get_token().await;

	assert!(matches!(retried, Err(Error::Authentication { .. })));
	assert!(tokens.current().is_none());
	assert_eq!(tokens.metrics().attempts(), 2);
	assert_eq!(tokens.metrics().failures(), 2);

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn force_refresh_joins_in_flight_refresh() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH);
			then.status(201)
				.delay(StdDuration::from_millis(150))
				.json_body(json!({ "access_token": ACCESS_TOKEN }));
		})
		.await;
	let client = build_client(&server);
	let tokens = client.token_manager();
	let (first, second) = tokio::join!(tokens.force_refresh(), tokens.force_refresh());

	assert_eq!(
		first.expect("First forced refresh should succeed."),
		second.expect("Second forced refresh should succeed.")
	);

	mock.assert_calls_async(1).await;

	tokens.force_refresh().await.expect("Later forced refresh should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn throttled_refresh_maps_to_refresh_denied() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH);
			then.status(400).json_body(
				json!({ "detail": "Cannot generate access token because another is valid" }),
			);
		})
		.await;
	let client = build_client(&server);
	let err = client.access_token().await.expect_err("Throttled refresh should fail.");

	assert!(matches!(err, Error::RefreshDenied { .. }), "Unexpected error: {err:?}.");
	assert!(err.is_authentication());
}

#[tokio::test]
async fn auth_server_errors_are_retried_then_surface() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH);
			then.status(503).body("maintenance");
		})
		.await;
	let client = build_client(&server);
	let err = client.access_token().await.expect_err("Persistent 5xx should fail the refresh.");

	assert!(matches!(
		err,
		Error::Transient(TransientError::UpstreamStatus { status: 503, attempts: 3, .. })
	));

	mock.assert_calls_async(3).await;
}
