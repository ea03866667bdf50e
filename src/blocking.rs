//! Synchronous facade over [`OffersClient`].
//!
//! [`BlockingOffersClient`] owns a small Tokio runtime and drives the async client on it, so
//! both calling conventions share one pipeline, one token manager, and one cache. It is
//! `Send + Sync`; share it across threads through [`Arc`] or by cloning.
//!
//! Calling its methods from inside an async runtime panics, as with any nested `block_on`.
//! Async code should use [`BlockingOffersClient::async_client`] instead. Dropping the last
//! clone is safe anywhere: the runtime is shut down in the background without waiting for its
//! worker.

// crates.io
use tokio::runtime::{Builder, Runtime};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenManager},
	cache::OffersCache,
	client::OffersClient,
	error::ConfigError,
	http::{HttpTransport, TransportErrorMapper},
	model::{Offer, Product},
};
#[cfg(feature = "reqwest")] use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Blocking client backed by the bundled reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestBlockingOffersClient =
	BlockingOffersClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Blocking client for the offers service.
pub struct BlockingOffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: OffersClient<C, M>,
	runtime: Arc<OwnedRuntime>,
}
impl<C, M> BlockingOffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps `client` with a dedicated runtime.
	pub fn new(client: OffersClient<C, M>) -> Result<Self> {
		let runtime = Builder::new_multi_thread()
			.worker_threads(1)
			.thread_name("offers-sdk-blocking")
			.enable_all()
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self { client, runtime: Arc::new(OwnedRuntime(Some(runtime))) })
	}

	/// Blocking form of [`OffersClient::register_product`].
	pub fn register_product(&self, product: &Product) -> Result<Uuid> {
		self.runtime.run(self.client.register_product(product))
	}

	/// Blocking form of [`OffersClient::get_offers`].
	pub fn get_offers(&self, product_id: Uuid) -> Result<Vec<Offer>> {
		self.runtime.run(self.client.get_offers(product_id))
	}

	/// Blocking form of [`OffersClient::access_token`].
	pub fn access_token(&self) -> Result<AccessToken> {
		self.runtime.run(self.client.access_token())
	}

	/// The async client sharing this client's state.
	pub fn async_client(&self) -> &OffersClient<C, M> {
		&self.client
	}

	/// Token manager shared with the async client.
	pub fn token_manager(&self) -> &TokenManager<C, M> {
		self.client.token_manager()
	}

	/// Offers cache shared with the async client.
	pub fn cache(&self) -> &OffersCache {
		self.client.cache()
	}
}
impl<C, M> Clone for BlockingOffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone(), runtime: self.runtime.clone() }
	}
}
impl<C, M> Debug for BlockingOffersClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BlockingOffersClient").field("client", &self.client).finish_non_exhaustive()
	}
}

/// Runtime shared by the clones of one blocking client.
///
/// Released with `shutdown_background`, which never blocks, so the last clone may be dropped
/// inside async code.
struct OwnedRuntime(Option<Runtime>);
impl OwnedRuntime {
	fn run<T, F>(&self, future: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		match &self.0 {
			Some(runtime) => runtime.block_on(future),
			None => Err(ConfigError::from(std::io::Error::other("blocking runtime is shut down"))
				.into()),
		}
	}
}
impl Drop for OwnedRuntime {
	fn drop(&mut self) {
		if let Some(runtime) = self.0.take() {
			runtime.shutdown_background();
		}
	}
}
