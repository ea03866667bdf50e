//! Single-flight access token manager.
//!
//! [`TokenManager`] hands out the cached [`AccessToken`] while it is valid and exchanges the
//! refresh token for a new one otherwise. The first caller that finds no valid token installs
//! a shared refresh future under the state lock before releasing it; every concurrent caller
//! awaits a clone of that future and receives the same token or the same error.
//!
//! The refresh future stores its own outcome, so it keeps running for the remaining waiters
//! when the caller that started it goes away. Failures are not cached: once a refresh fails,
//! or panics, the next caller starts a new one.
//!
//! A token's lifetime is measured from the moment the successful auth attempt was sent, so
//! time spent in earlier failed attempts, backoff, or waiting for a caller to resume a joined
//! refresh never extends it.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	api::{self, ApiRequest},
	auth::{AccessToken, RefreshToken, TokenSecret},
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
	pipeline::Dispatcher,
};

type PendingRefresh = Shared<BoxFuture<'static, Result<AccessToken>>>;

#[derive(Default)]
struct TokenState {
	current: Option<AccessToken>,
	in_flight: Option<PendingRefresh>,
}

/// Owns the refresh token and the cached access token of one client.
pub struct TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	inner: Arc<ManagerInner<C, M>>,
}
impl<C, M> TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		refresh_token: RefreshToken,
		base_url: &Url,
		dispatcher: Dispatcher<C, M>,
		ttl: Duration,
	) -> Result<Self> {
		let inner = ManagerInner {
			request: ApiRequest::authenticate(base_url)?,
			refresh_token,
			dispatcher,
			ttl,
			state: Mutex::new(TokenState::default()),
			metrics: RefreshMetrics::default(),
		};

		Ok(Self { inner: Arc::new(inner) })
	}

	/// Returns a valid access token, refreshing it when necessary.
	pub async fn get_token(&self) -> Result<AccessToken> {
		let pending = {
			let mut state = self.inner.state.lock();
			let now = OffsetDateTime::now_utc();

			if let Some(token) = state.current.as_ref().filter(|token| token.is_valid_at(now)) {
				return Ok(token.clone());
			}

			self.join_or_start(&mut state)
		};

		pending.await
	}

	/// Discards the cached token and refreshes.
	///
	/// Joins the refresh already in flight, if any, instead of sending a second one.
	pub async fn force_refresh(&self) -> Result<AccessToken> {
		let pending = {
			let mut state = self.inner.state.lock();

			state.current = None;

			self.join_or_start(&mut state)
		};

		pending.await
	}

	/// Recovers from the service rejecting `rejected`.
	///
	/// When another caller already replaced the rejected token with a valid one, that token is
	/// returned without network I/O. Otherwise this behaves like
	/// [`force_refresh`](Self::force_refresh).
	pub async fn refresh_after_rejection(&self, rejected: &AccessToken) -> Result<AccessToken> {
		let pending = {
			let mut state = self.inner.state.lock();
			let now = OffsetDateTime::now_utc();

			if let Some(token) = state
				.current
				.as_ref()
				.filter(|token| *token != rejected && token.is_valid_at(now))
			{
				return Ok(token.clone());
			}

			state.current = None;

			self.join_or_start(&mut state)
		};

		pending.await
	}

	/// Cached token, if any, without validity checks or network I/O.
	pub fn current(&self) -> Option<AccessToken> {
		self.inner.state.lock().current.clone()
	}

	/// Returns `true` while a refresh is running.
	pub fn is_refreshing(&self) -> bool {
		self.inner.state.lock().in_flight.is_some()
	}

	/// Refresh counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.inner.metrics
	}

	/// Log-safe fingerprint of the refresh token.
	pub fn refresh_token_fingerprint(&self) -> &str {
		self.inner.refresh_token.fingerprint()
	}

	fn join_or_start(&self, state: &mut TokenState) -> PendingRefresh {
		if let Some(pending) = state.in_flight.as_ref() {
			return pending.clone();
		}

		let inner = self.inner.clone();
		let pending = async move { inner.refresh().await }.boxed().shared();

		state.in_flight = Some(pending.clone());

		pending
	}
}
impl<C, M> Clone for TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("TokenManager")
			.field("refresh_token", &self.inner.refresh_token)
			.field("ttl", &self.inner.ttl)
			.field("current", &state.current)
			.field("refreshing", &state.in_flight.is_some())
			.finish_non_exhaustive()
	}
}

struct ManagerInner<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	refresh_token: RefreshToken,
	request: ApiRequest,
	dispatcher: Dispatcher<C, M>,
	ttl: Duration,
	state: Mutex<TokenState>,
	metrics: RefreshMetrics,
}
impl<C, M> ManagerInner<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	async fn refresh(self: Arc<Self>) -> Result<AccessToken> {
		const KIND: CallKind = CallKind::Authenticate;

		let span = CallSpan::new(KIND, "refresh");
		let mut unwind_reset =
			InFlightReset { state: &self.state, metrics: &self.metrics, armed: true };

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record(CallOutcome::Attempt);

		let result = span.instrument(self.exchange()).await;

		{
			let mut state = self.state.lock();

			state.in_flight = None;
			unwind_reset.armed = false;

			if let Ok(token) = &result {
				state.current = Some(token.clone());
			}
		}

		let outcome = CallOutcome::of(&result);

		self.metrics.record(outcome);
		obs::record_call_outcome(KIND, outcome);

		result
	}

	async fn exchange(&self) -> Result<AccessToken> {
		// The service starts the token lifetime when it receives the successful attempt.
		let (response, issued_at) =
			self.dispatcher.send_timed(&self.request, self.refresh_token.expose()).await?;
		let secret = api::read_access_token(&response)?;
		let token = AccessToken::issued(TokenSecret::new(secret), issued_at, self.ttl);

		obs::token_refreshed(self.refresh_token.fingerprint(), token.refresh_at());

		Ok(token)
	}
}

/// Releases the in-flight slot when a refresh unwinds before publishing its outcome, so the
/// next caller starts a fresh refresh instead of joining a poisoned one.
struct InFlightReset<'a> {
	state: &'a Mutex<TokenState>,
	metrics: &'a RefreshMetrics,
	armed: bool,
}
impl Drop for InFlightReset<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.state.lock().in_flight = None;
			self.metrics.record(CallOutcome::Failure);
		}
	}
}
