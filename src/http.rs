//! Transport primitives for calls against the offers service.
//!
//! [`HttpTransport`] is the SDK's only dependency on an HTTP stack: it sends one
//! [`HttpRequest`] and yields the raw [`HttpResponse`], whatever its status. Status
//! interpretation, retries, and authentication live above it in [`crate::pipeline`], so a
//! backend swap never changes pipeline behavior. Transport failures are classified by a
//! companion [`TransportErrorMapper`].

pub use oauth2::{
	self, HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
};

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransientError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing SDK requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every clone of a client, and the futures they return must be `Send` so callers can move
/// SDK futures across executor threads. Implementations should return `Ok` for every
/// response that carried a status line, including 4xx and 5xx; `Err` is reserved for
/// failures that produced no response at all.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves to the response, whatever its status.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Maps HTTP transport failures into SDK [`Error`] values.
///
/// Returning [`Error::Transient`] marks the failure as retryable; any other variant ends the
/// request immediately.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an SDK error.
	fn map_transport_error(&self, error: HttpClientError<E>) -> Error;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with a per-request timeout.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self> {
		let client = ReqwestClient::builder().timeout(timeout).build().map_err(ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn send(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let response =
				self.0.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransientError::network(inner).into(),
			HttpClientError::Other(message) => TransientError::transport(message).into(),
			_ => TransientError::transport("unrecognized transport failure").into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::timeout().into();
	}

	TransientError::network(err).into()
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn connection_refused_maps_to_transient() {
		// Nothing listens on the local discard port.
		let transport = ReqwestHttpClient::default();
		let request = oauth2::http::Request::builder()
			.method(Method::GET)
			.uri("http://127.0.0.1:9/api/v1/products")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let err = transport.send(request).await.expect_err("Closed port should fail to connect.");
		let mapped = ReqwestTransportErrorMapper.map_transport_error(err);

		assert!(mapped.is_transient(), "Connect failures must be retryable, got {mapped:?}.");
	}

	#[test]
	fn other_transport_failures_keep_their_message() {
		let mapped = ReqwestTransportErrorMapper
			.map_transport_error(HttpClientError::Other("connection closed".into()));

		assert!(matches!(
			mapped,
			Error::Transient(TransientError::Transport { ref message, attempts: 1 })
				if message == "connection closed"
		));
	}
}
