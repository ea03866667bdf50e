//! Authenticating request pipeline.
//!
//! [`Dispatcher`] sends one logical request, retrying transient failures (transport errors the
//! mapper classifies as transient, and 5xx responses) within the [`RetryPolicy`] budget and
//! notifying hooks around every attempt. [`Pipeline`] layers credentials on top: it fetches a
//! token from the [`TokenManager`], and when the service answers 401 it refreshes once and
//! resends once. A second 401 ends the call with [`Error::Authentication`].

pub mod retry;

pub use retry::RetryPolicy;

// self
use crate::{
	_prelude::*,
	api::{self, ApiRequest},
	auth::TokenManager,
	error::TransientError,
	ext::HookChain,
	http::{HttpResponse, HttpTransport, StatusCode, TransportErrorMapper},
	obs,
};

pub(crate) struct Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	transport: Arc<C>,
	mapper: Arc<M>,
	hooks: HookChain,
	retry: RetryPolicy,
}
impl<C, M> Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		transport: Arc<C>,
		mapper: Arc<M>,
		hooks: HookChain,
		retry: RetryPolicy,
	) -> Self {
		Self { transport, mapper, hooks, retry }
	}

	pub(crate) fn retry_policy(&self) -> &RetryPolicy {
		&self.retry
	}

	/// Sends `request` until it yields a non-5xx response or the retry budget runs out.
	pub(crate) async fn send(&self, request: &ApiRequest, bearer: &str) -> Result<HttpResponse> {
		self.send_timed(request, bearer).await.map(|(response, _)| response)
	}

	/// Same as [`send`](Self::send), also returning the instant the answered attempt left.
	pub(crate) async fn send_timed(
		&self,
		request: &ApiRequest,
		bearer: &str,
	) -> Result<(HttpResponse, OffsetDateTime)> {
		let mut attempt = 0;

		loop {
			attempt += 1;

			let outbound = request.to_http(bearer)?;

			self.hooks.notify_request(&outbound);

			let sent_at = OffsetDateTime::now_utc();
			let failure = match self.transport.send(outbound).await {
				Ok(response) => {
					self.hooks.notify_response(&response);

					if !response.status().is_server_error() {
						return Ok((response, sent_at));
					}

					TransientError::UpstreamStatus {
						status: response.status().as_u16(),
						message: api::detail(&response),
						retry_after: retry::parse_retry_after(response.headers()),
						attempts: attempt,
					}
				},
				Err(err) => match self.mapper.map_transport_error(err) {
					Error::Transient(failure) => failure,
					other => return Err(other),
				},
			};

			if attempt >= self.retry.max_attempts() {
				return Err(failure.with_attempts(attempt).into());
			}

			let delay = self.retry.delay_for(attempt, failure.retry_after());

			obs::retry_scheduled(request.call, attempt, delay, &failure);

			if delay.is_positive() {
				tokio::time::sleep(delay.unsigned_abs()).await;
			}
		}
	}
}
impl<C, M> Clone for Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			mapper: self.mapper.clone(),
			hooks: self.hooks.clone(),
			retry: self.retry,
		}
	}
}

pub(crate) struct Pipeline<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	tokens: TokenManager<C, M>,
	dispatcher: Dispatcher<C, M>,
}
impl<C, M> Pipeline<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(tokens: TokenManager<C, M>, dispatcher: Dispatcher<C, M>) -> Self {
		Self { tokens, dispatcher }
	}

	pub(crate) fn tokens(&self) -> &TokenManager<C, M> {
		&self.tokens
	}

	pub(crate) fn retry_policy(&self) -> &RetryPolicy {
		self.dispatcher.retry_policy()
	}

	/// Runs `request` with credentials, recovering from exactly one 401.
	///
	/// The returned response is never a 401 or a 5xx; readers in [`api`] classify the rest.
	pub(crate) async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse> {
		let token = self.tokens.get_token().await?;
		let response = self.dispatcher.send(request, token.expose()).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}

		obs::access_token_rejected(request.call);

		let token = self.tokens.refresh_after_rejection(&token).await?;
		let response = self.dispatcher.send(request, token.expose()).await?;

		if response.status() == StatusCode::UNAUTHORIZED {
			return Err(Error::Authentication {
				reason: format!(
					"access token rejected again after a refresh ({})",
					api::detail(&response)
				),
			});
		}

		Ok(response)
	}
}
