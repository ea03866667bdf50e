//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	io,
	sync::atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
use serde_json::json;
// self
use offers_sdk::{
	ClientBuilder, Error, OffersClient,
	error::{ConfigError, TransientError},
	ext::RequestHook,
	http::{
		HeaderName, HeaderValue, HttpClientError, HttpRequest, HttpResponse, HttpTransport,
		StatusCode, TransportErrorMapper, TransportFuture,
	},
	time::Duration,
};

pub use std::sync::Arc;

pub const REFRESH_TOKEN: &str = "refresh-it";
pub const ACCESS_TOKEN: &str = "access-it";
pub const AUTH_PATH: &str = "/api/v1/auth";
pub const REGISTER_PATH: &str = "/api/v1/products/register";

/// Builder pointed at `base_url` with retries that never sleep.
pub fn test_builder(base_url: impl Into<String>) -> ClientBuilder {
	ClientBuilder::new(REFRESH_TOKEN).base_url(base_url).backoff(Duration::ZERO, Duration::ZERO)
}

pub fn offers_path(product_id: impl std::fmt::Display) -> String {
	format!("/api/v1/products/{product_id}/offers")
}

/// Auth endpoint that accepts [`REFRESH_TOKEN`] and issues [`ACCESS_TOKEN`].
pub async fn mock_auth(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH).header("Bearer", REFRESH_TOKEN);
			then.status(201).json_body(json!({ "access_token": ACCESS_TOKEN }));
		})
		.await
}

/// Canned response, or connection failure, served by [`ScriptedTransport`].
#[derive(Clone, Debug)]
pub enum Step {
	Respond(u16, String),
	RespondWithHeader(u16, String, &'static str, &'static str),
	Reset,
	Fatal,
	Panic,
}

/// Request as observed by [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seen {
	pub method: String,
	pub path: String,
	pub bearer: Option<String>,
}

/// In-memory transport replaying scripted steps.
///
/// Auth calls without a scripted step are answered with `access-1`, `access-2`, ... in order;
/// other calls without a step get `200 []`.
#[derive(Default)]
pub struct ScriptedTransport {
	auth: Mutex<VecDeque<Step>>,
	api: Mutex<VecDeque<Step>>,
	seen: Mutex<Vec<Seen>>,
	issued: AtomicUsize,
	auth_delay: Mutex<Option<std::time::Duration>>,
}
impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_auth_steps(self, steps: impl IntoIterator<Item = Step>) -> Self {
		self.auth.lock().extend(steps);

		self
	}

	pub fn with_api_steps(self, steps: impl IntoIterator<Item = Step>) -> Self {
		self.api.lock().extend(steps);

		self
	}

	pub fn with_auth_delay(self, delay: std::time::Duration) -> Self {
		*self.auth_delay.lock() = Some(delay);

		self
	}

	pub fn seen(&self) -> Vec<Seen> {
		self.seen.lock().clone()
	}

	pub fn auth_calls(&self) -> usize {
		self.seen.lock().iter().filter(|seen| seen.path == AUTH_PATH).count()
	}

	pub fn api_calls(&self) -> usize {
		self.seen.lock().iter().filter(|seen| seen.path != AUTH_PATH).count()
	}

	fn next_step(&self, path: &str) -> Step {
		if path == AUTH_PATH {
			self.auth.lock().pop_front().unwrap_or_else(|| {
				let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

				Step::Respond(201, json!({ "access_token": format!("access-{n}") }).to_string())
			})
		} else {
			self.api.lock().pop_front().unwrap_or_else(|| Step::Respond(200, "[]".into()))
		}
	}
}
impl HttpTransport for ScriptedTransport {
	type TransportError = io::Error;

	fn send(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let path = request.uri().path().to_owned();
		let bearer = request
			.headers()
			.get("Bearer")
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		let method = request.method().to_string();

		self.seen.lock().push(Seen { method, path: path.clone(), bearer });

		let step = self.next_step(&path);
		let delay = if path == AUTH_PATH { *self.auth_delay.lock() } else { None };

		Box::pin(async move {
			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			match step {
				Step::Respond(status, body) => Ok(response(status, body, None)),
				Step::RespondWithHeader(status, body, name, value) =>
					Ok(response(status, body, Some((name, value)))),
				Step::Reset => Err(HttpClientError::Io(io::Error::new(
					io::ErrorKind::ConnectionReset,
					"connection reset by peer",
				))),
				Step::Fatal => Err(HttpClientError::Other("fatal".into())),
				Step::Panic => panic!("scripted transport panicked"),
			}
		})
	}
}

fn response(
	status: u16,
	body: String,
	header: Option<(&'static str, &'static str)>,
) -> HttpResponse {
	let mut response = HttpResponse::new(body.into_bytes());

	*response.status_mut() =
		StatusCode::from_u16(status).expect("Scripted status should be valid.");

	if let Some((name, value)) = header {
		response
			.headers_mut()
			.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
	}

	response
}

/// Maps I/O failures to retryable errors and everything else to configuration errors.
#[derive(Debug, Default)]
pub struct ScriptedMapper;
impl TransportErrorMapper<io::Error> for ScriptedMapper {
	fn map_transport_error(&self, error: HttpClientError<io::Error>) -> Error {
		match error {
			HttpClientError::Io(inner) => TransientError::network(inner).into(),
			other => ConfigError::http_client_build(io::Error::other(other.to_string())).into(),
		}
	}
}

pub type ScriptedClient = OffersClient<ScriptedTransport, ScriptedMapper>;

pub fn scripted_client(
	builder: ClientBuilder,
	transport: ScriptedTransport,
) -> (ScriptedClient, Arc<ScriptedTransport>) {
	let transport = Arc::new(transport);
	let client = builder
		.build_with_transport(transport.clone(), Arc::new(ScriptedMapper))
		.expect("Scripted client should build.");

	(client, transport)
}

/// Hook appending `request <path>` and `response <status>` lines to a shared log.
#[derive(Clone, Default)]
pub struct RecordingHook {
	pub tag: &'static str,
	pub log: Arc<Mutex<Vec<String>>>,
}
impl RequestHook for RecordingHook {
	fn on_request(&self, request: &HttpRequest) {
		self.log.lock().push(format!("{} request {}", self.tag, request.uri().path()));
	}

	fn on_response(&self, response: &HttpResponse) {
		self.log.lock().push(format!("{} response {}", self.tag, response.status().as_u16()));
	}
}
