//! Wire contract of the offers service.
//!
//! Request builders and response readers for the three remote operations. Readers receive
//! every response that is not a retryable 5xx and turn its status into a typed value or a
//! categorized [`Error`].

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, TransientError},
	http::{HeaderValue, HttpRequest, HttpResponse, Method, oauth2::http},
	model::{Offer, Product},
	obs::CallKind,
};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://python.exercise.applifting.cz";
/// Header carrying both the refresh token and the access token.
pub const BEARER_HEADER: &str = "Bearer";

const AUTH_PATH: &str = "api/v1/auth";
const REGISTER_PATH: &str = "api/v1/products/register";
const REFRESH_DENIED_MARKER: &str = "Cannot generate";

/// A fully resolved call that can be rendered repeatedly, once per attempt.
#[derive(Clone, Debug)]
pub(crate) struct ApiRequest {
	pub(crate) call: CallKind,
	method: Method,
	url: Url,
	body: Option<Vec<u8>>,
}
impl ApiRequest {
	pub(crate) fn authenticate(base: &Url) -> Result<Self> {
		Ok(Self {
			call: CallKind::Authenticate,
			method: Method::POST,
			url: join(base, AUTH_PATH)?,
			body: None,
		})
	}

	pub(crate) fn register_product(base: &Url, product: &Product) -> Result<Self> {
		let body = serde_json::to_vec(product).map_err(|e| Error::Validation {
			detail: format!("product could not be serialized: {e}"),
		})?;

		Ok(Self {
			call: CallKind::RegisterProduct,
			method: Method::POST,
			url: join(base, REGISTER_PATH)?,
			body: Some(body),
		})
	}

	pub(crate) fn get_offers(base: &Url, product_id: Uuid) -> Result<Self> {
		Ok(Self {
			call: CallKind::GetOffers,
			method: Method::GET,
			url: join(base, &format!("api/v1/products/{product_id}/offers"))?,
			body: None,
		})
	}

	/// Renders the request with `bearer` as the credential header.
	pub(crate) fn to_http(&self, bearer: &str) -> Result<HttpRequest> {
		let mut credential = HeaderValue::from_str(bearer).map_err(|_| Error::Authentication {
			reason: "credential contains characters that cannot be sent in a header".into(),
		})?;

		credential.set_sensitive(true);

		let mut builder = http::Request::builder()
			.method(self.method.clone())
			.uri(self.url.as_str())
			.header(BEARER_HEADER, credential)
			.header(http::header::ACCEPT, "application/json");

		if self.body.is_some() {
			builder = builder.header(http::header::CONTENT_TYPE, "application/json");
		}

		let request = builder
			.body(self.body.clone().unwrap_or_default())
			.map_err(ConfigError::from)?;

		Ok(request)
	}
}

#[derive(Deserialize)]
struct AccessTokenBody {
	access_token: String,
}

#[derive(Deserialize)]
struct RegisteredBody {
	id: Uuid,
}

#[derive(Deserialize)]
struct DetailBody {
	detail: serde_json::Value,
}

/// Reads the auth endpoint's answer.
pub(crate) fn read_access_token(response: &HttpResponse) -> Result<String> {
	let status = response.status();

	if status.is_success() {
		return decode_json::<AccessTokenBody>(response).map(|body| body.access_token);
	}

	let detail = detail(response);

	match status.as_u16() {
		400 if detail.contains(REFRESH_DENIED_MARKER) => Err(Error::RefreshDenied { reason: detail }),
		400 | 401 | 403 => Err(Error::Authentication { reason: detail }),
		_ => Err(categorize(response, detail)),
	}
}

/// Reads the registration endpoint's answer.
pub(crate) fn read_registered_id(response: &HttpResponse, product_id: Uuid) -> Result<Uuid> {
	let status = response.status();

	if status.is_success() {
		return decode_json::<RegisteredBody>(response).map(|body| body.id);
	}

	match status.as_u16() {
		409 => Err(Error::ProductAlreadyExists { product_id }),
		_ => Err(categorize(response, detail(response))),
	}
}

/// Reads the offers endpoint's answer.
pub(crate) fn read_offers(response: &HttpResponse, product_id: Uuid) -> Result<Vec<Offer>> {
	let status = response.status();

	if status.is_success() {
		return decode_json(response);
	}

	match status.as_u16() {
		404 => Err(Error::ProductNotFound { product_id }),
		_ => Err(categorize(response, detail(response))),
	}
}

fn categorize(response: &HttpResponse, detail: String) -> Error {
	let status = response.status();

	match status.as_u16() {
		401 => Error::Authentication { reason: detail },
		422 => Error::Validation { detail },
		code if status.is_server_error() => TransientError::UpstreamStatus {
			status: code,
			message: detail,
			retry_after: None,
			attempts: 1,
		}
		.into(),
		code => Error::Api { status: code, body: body_text(response) },
	}
}

fn decode_json<T>(response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		DecodeError::Json { source: Arc::new(source), status: response.status().as_u16() }.into()
	})
}

/// Extracts a human readable reason, preferring the service's `detail` field.
pub(crate) fn detail(response: &HttpResponse) -> String {
	if let Ok(DetailBody { detail }) = serde_json::from_slice::<DetailBody>(response.body()) {
		return match detail {
			serde_json::Value::String(text) => text,
			other => other.to_string(),
		};
	}

	let text = body_text(response);

	if text.is_empty() {
		response.status().canonical_reason().unwrap_or("no reason given").to_owned()
	} else {
		text
	}
}

fn body_text(response: &HttpResponse) -> String {
	String::from_utf8_lossy(response.body()).trim().to_owned()
}

fn join(base: &Url, path: &str) -> Result<Url> {
	Ok(base.join(path).map_err(|source| ConfigError::InvalidBaseUrl { source })?)
}
