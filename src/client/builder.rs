//! Validating builder for [`OffersClient`].

// self
use crate::{
	_prelude::*,
	api::DEFAULT_BASE_URL,
	auth::{DEFAULT_TOKEN_TTL, RefreshToken, TokenManager},
	cache::{DEFAULT_OFFERS_TTL, OffersCache},
	client::OffersClient,
	error::ConfigError,
	ext::{HookChain, RequestHook},
	http::{HttpTransport, TransportErrorMapper},
	pipeline::{Dispatcher, Pipeline, RetryPolicy},
};
#[cfg(all(feature = "blocking", feature = "reqwest"))]
use crate::blocking::{BlockingOffersClient, ReqwestBlockingOffersClient};
#[cfg(feature = "reqwest")]
use crate::{
	client::ReqwestOffersClient,
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

/// Environment variable holding the refresh token.
pub const REFRESH_TOKEN_ENV: &str = "OFFERS_SDK_REFRESH_TOKEN";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "OFFERS_SDK_BASE_URL";
/// Per-request timeout of the bundled reqwest transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(30);

/// Collects client settings and validates them on build.
///
/// Every setter is infallible; all checks run in the `build*` methods and surface as
/// [`ConfigError`].
#[derive(Clone)]
pub struct ClientBuilder {
	refresh_token: String,
	base_url: String,
	max_attempts: u32,
	base_delay: Duration,
	max_delay: Duration,
	token_ttl: Duration,
	offers_ttl: Duration,
	request_timeout: Duration,
	hooks: Vec<Arc<dyn RequestHook>>,
	#[cfg(feature = "reqwest")]
	reqwest_client: Option<ReqwestClient>,
}
impl ClientBuilder {
	/// Starts a builder with default settings.
	pub fn new(refresh_token: impl Into<String>) -> Self {
		Self {
			refresh_token: refresh_token.into(),
			base_url: DEFAULT_BASE_URL.into(),
			max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
			base_delay: RetryPolicy::DEFAULT_BASE_DELAY,
			max_delay: RetryPolicy::DEFAULT_MAX_DELAY,
			token_ttl: DEFAULT_TOKEN_TTL,
			offers_ttl: DEFAULT_OFFERS_TTL,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			hooks: Vec::new(),
			#[cfg(feature = "reqwest")]
			reqwest_client: None,
		}
	}

	/// Seeds a builder from [`REFRESH_TOKEN_ENV`] and, when set, [`BASE_URL_ENV`].
	pub fn from_env() -> Result<Self> {
		Self::from_env_with(|name| std::env::var(name).ok())
	}

	fn from_env_with<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let refresh_token = lookup(REFRESH_TOKEN_ENV)
			.ok_or(ConfigError::MissingEnv { name: REFRESH_TOKEN_ENV })?;
		let mut builder = Self::new(refresh_token);

		if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
			builder = builder.base_url(base_url);
		}

		Ok(builder)
	}

	/// Overrides the service base URL.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();

		self
	}

	/// Total attempts per call, including the first.
	pub fn max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;

		self
	}

	/// Backoff delay before the first retry and the ceiling for any later one.
	pub fn backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
		self.base_delay = base_delay;
		self.max_delay = max_delay;

		self
	}

	/// Copies every retry setting from `policy`.
	pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.max_attempts = policy.max_attempts();
		self.base_delay = policy.base_delay();
		self.max_delay = policy.max_delay();

		self
	}

	/// Effective access token lifetime; capped at the server lifetime of 300 seconds.
	pub fn token_ttl(mut self, ttl: Duration) -> Self {
		self.token_ttl = ttl;

		self
	}

	/// Offers cache TTL; zero disables caching.
	pub fn offers_ttl(mut self, ttl: Duration) -> Self {
		self.offers_ttl = ttl;

		self
	}

	/// Per-request timeout of the bundled reqwest transport.
	///
	/// Ignored when a custom reqwest client or transport is supplied.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Appends an observer hook.
	pub fn hook(mut self, hook: impl RequestHook + 'static) -> Self {
		self.hooks.push(Arc::new(hook));

		self
	}

	/// Appends several shared hooks, keeping their order.
	pub fn hooks<I>(mut self, hooks: I) -> Self
	where
		I: IntoIterator<Item = Arc<dyn RequestHook>>,
	{
		self.hooks.extend(hooks);

		self
	}

	/// Uses a preconfigured reqwest client for [`build`](Self::build).
	#[cfg(feature = "reqwest")]
	pub fn reqwest_client(mut self, client: ReqwestClient) -> Self {
		self.reqwest_client = Some(client);

		self
	}

	/// Builds a client on the bundled reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build(self) -> Result<ReqwestOffersClient> {
		let transport = match self.reqwest_client.clone() {
			Some(client) => ReqwestHttpClient::with_client(client),
			None => {
				if !self.request_timeout.is_positive() {
					return Err(ConfigError::InvalidTimeout.into());
				}

				ReqwestHttpClient::with_timeout(self.request_timeout.unsigned_abs())?
			},
		};

		self.build_with_transport(Arc::new(transport), Arc::new(ReqwestTransportErrorMapper))
	}

	/// Builds a blocking client on the bundled reqwest transport.
	#[cfg(all(feature = "blocking", feature = "reqwest"))]
	pub fn build_blocking(self) -> Result<ReqwestBlockingOffersClient> {
		BlockingOffersClient::new(self.build()?)
	}

	/// Builds a client on a caller-supplied transport and error mapper.
	pub fn build_with_transport<C, M>(
		self,
		transport: Arc<C>,
		mapper: Arc<M>,
	) -> Result<OffersClient<C, M>>
	where
		C: ?Sized + HttpTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		let settings = self.validate()?;
		let dispatcher =
			Dispatcher::new(transport, mapper, HookChain::new(self.hooks), settings.retry);
		let tokens = TokenManager::new(
			settings.refresh_token,
			&settings.base_url,
			dispatcher.clone(),
			settings.token_ttl,
		)?;
		let pipeline = Pipeline::new(tokens, dispatcher);

		let cache = OffersCache::new(settings.offers_ttl);

		Ok(OffersClient::from_parts(pipeline, cache, settings.base_url))
	}

	fn validate(&self) -> Result<Settings, ConfigError> {
		let refresh_token = RefreshToken::new(self.refresh_token.clone())?;
		let base_url = normalize_base_url(&self.base_url)?;
		let retry = RetryPolicy::new(self.max_attempts, self.base_delay, self.max_delay)?;

		if !self.token_ttl.is_positive() {
			return Err(ConfigError::NonPositiveTokenTtl);
		}
		if self.offers_ttl.is_negative() {
			return Err(ConfigError::NegativeOffersTtl);
		}

		Ok(Settings {
			refresh_token,
			base_url,
			retry,
			token_ttl: self.token_ttl,
			offers_ttl: self.offers_ttl,
		})
	}
}
impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("refresh_token", &"<redacted>")
			.field("base_url", &self.base_url)
			.field("max_attempts", &self.max_attempts)
			.field("base_delay", &self.base_delay)
			.field("max_delay", &self.max_delay)
			.field("token_ttl", &self.token_ttl)
			.field("offers_ttl", &self.offers_ttl)
			.field("request_timeout", &self.request_timeout)
			.field("hooks", &self.hooks.len())
			.finish_non_exhaustive()
	}
}

struct Settings {
	refresh_token: RefreshToken,
	base_url: Url,
	retry: RetryPolicy,
	token_ttl: Duration,
	offers_ttl: Duration,
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
	let mut url =
		Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { url: url.into() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_gains_trailing_slash() {
		let url = normalize_base_url("http://127.0.0.1:8080/gateway?x=1")
			.expect("HTTP base URL should be accepted.");

		assert_eq!(url.as_str(), "http://127.0.0.1:8080/gateway/");
		assert_eq!(
			normalize_base_url(DEFAULT_BASE_URL).expect("Default base URL should parse.").as_str(),
			"https://python.exercise.applifting.cz/"
		);
	}

	#[test]
	fn base_url_rejects_other_schemes() {
		assert!(matches!(
			normalize_base_url("ftp://offers.test"),
			Err(ConfigError::UnsupportedScheme { .. })
		));
		assert!(matches!(normalize_base_url("not a url"), Err(ConfigError::InvalidBaseUrl { .. })));
	}

	#[test]
	fn validate_reports_each_setting() {
		let base = ClientBuilder::new("refresh");

		assert!(matches!(
			ClientBuilder::new(" ").validate(),
			Err(ConfigError::EmptyRefreshToken)
		));
		assert!(matches!(base.clone().max_attempts(0).validate(), Err(ConfigError::ZeroAttempts)));
		assert!(matches!(
			base.clone().token_ttl(Duration::ZERO).validate(),
			Err(ConfigError::NonPositiveTokenTtl)
		));
		assert!(matches!(
			base.clone().offers_ttl(Duration::seconds(-1)).validate(),
			Err(ConfigError::NegativeOffersTtl)
		));
		assert!(matches!(
			base.clone().backoff(Duration::seconds(3), Duration::seconds(1)).validate(),
			Err(ConfigError::InvalidBackoff)
		));

		let settings = base.offers_ttl(Duration::ZERO).validate().expect("Defaults should validate.");

		assert_eq!(settings.retry, RetryPolicy::default());
		assert_eq!(settings.token_ttl, DEFAULT_TOKEN_TTL);
		assert_eq!(settings.offers_ttl, Duration::ZERO);
	}

	#[test]
	fn from_env_requires_refresh_token() {
		let missing = ClientBuilder::from_env_with(|_| None)
			.expect_err("Missing refresh token should be reported.");

		assert!(matches!(
			missing,
			Error::Config(ConfigError::MissingEnv { name: REFRESH_TOKEN_ENV })
		));

		let builder = ClientBuilder::from_env_with(|name| match name {
			REFRESH_TOKEN_ENV => Some("refresh".into()),
			BASE_URL_ENV => Some("http://localhost:9000".into()),
			_ => None,
		})
		.expect("Refresh token should be read from the environment.");

		assert_eq!(builder.base_url, "http://localhost:9000");
		assert_eq!(builder.refresh_token, "refresh");
	}

	#[test]
	fn debug_redacts_refresh_token() {
		let rendered = format!("{:?}", ClientBuilder::new("super-secret"));

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
