//! Async client facade.
//!
//! [`OffersClient`] is cheap to clone; every clone shares one token manager, one offers cache,
//! and one transport. Build it with [`ClientBuilder`].

pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	api::{self, ApiRequest},
	auth::{AccessToken, TokenManager},
	cache::OffersCache,
	http::{HttpTransport, TransportErrorMapper},
	model::{Offer, Product},
	obs::{self, CacheOutcome, CallKind, CallOutcome, CallSpan},
	pipeline::{Pipeline, RetryPolicy},
};
#[cfg(feature = "reqwest")] use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Client backed by the bundled reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestOffersClient = OffersClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Async client for the offers service.
pub struct OffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	inner: Arc<ClientInner<C, M>>,
}
impl<C, M> OffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_parts(pipeline: Pipeline<C, M>, cache: OffersCache, base_url: Url) -> Self {
		Self { inner: Arc::new(ClientInner { pipeline, cache, base_url }) }
	}

	/// Registers `product` and returns the identifier the service stored.
	///
	/// Registration results are never cached.
	pub async fn register_product(&self, product: &Product) -> Result<Uuid> {
		const KIND: CallKind = CallKind::RegisterProduct;

		let span = CallSpan::new(KIND, "register_product");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let request = ApiRequest::register_product(&self.inner.base_url, product)?;
				let response = self.inner.pipeline.execute(&request).await?;

				api::read_registered_id(&response, product.id)
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Lists the offers of `product_id`.
	///
	/// A fresh cached payload is returned without network I/O. On a miss the service is queried
	/// and a successful answer replaces the cache entry; failures leave the cache untouched.
	/// Concurrent misses for one product are not coalesced, so each may reach the service and
	/// the last one to finish wins the entry.
	pub async fn get_offers(&self, product_id: Uuid) -> Result<Vec<Offer>> {
		const KIND: CallKind = CallKind::GetOffers;

		let span = CallSpan::new(KIND, "get_offers");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.lookup_or_fetch(product_id)).await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Returns a valid access token, refreshing it when necessary.
	pub async fn access_token(&self) -> Result<AccessToken> {
		self.inner.pipeline.tokens().get_token().await
	}

	/// Token manager shared by every clone of this client.
	pub fn token_manager(&self) -> &TokenManager<C, M> {
		self.inner.pipeline.tokens()
	}

	/// Offers cache shared by every clone of this client.
	pub fn cache(&self) -> &OffersCache {
		&self.inner.cache
	}

	/// Normalized base URL, always ending with a slash.
	pub fn base_url(&self) -> &Url {
		&self.inner.base_url
	}

	/// Retry budget applied to every call.
	pub fn retry_policy(&self) -> &RetryPolicy {
		self.inner.pipeline.retry_policy()
	}
}
#[cfg(feature = "reqwest")]
impl OffersClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Starts a [`ClientBuilder`] for the reqwest-backed client.
	pub fn builder(refresh_token: impl Into<String>) -> ClientBuilder {
		ClientBuilder::new(refresh_token)
	}
}
impl<C, M> OffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	async fn lookup_or_fetch(&self, product_id: Uuid) -> Result<Vec<Offer>> {
		let cache = &self.inner.cache;
		let decision = if !cache.is_enabled() {
			CacheOutcome::Bypass
		} else if let Some(offers) = cache.lookup(product_id) {
			obs::cache_decision(CacheOutcome::Hit, product_id);
			obs::record_cache_outcome(CacheOutcome::Hit);

			return Ok(offers);
		} else {
			CacheOutcome::Miss
		};

		obs::cache_decision(decision, product_id);
		obs::record_cache_outcome(decision);

		let request = ApiRequest::get_offers(&self.inner.base_url, product_id)?;
		let response = self.inner.pipeline.execute(&request).await?;
		let offers = api::read_offers(&response, product_id)?;

		cache.store(product_id, offers.clone());

		Ok(offers)
	}
}
impl<C, M> Clone for OffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<C, M> Debug for OffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OffersClient")
			.field("base_url", &self.inner.base_url.as_str())
			.field("tokens", self.inner.pipeline.tokens())
			.field("cache", &self.inner.cache)
			.finish_non_exhaustive()
	}
}

struct ClientInner<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pipeline: Pipeline<C, M>,
	cache: OffersCache,
	base_url: Url,
}
