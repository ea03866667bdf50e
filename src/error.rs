//! SDK-level error types shared by the token manager, pipeline, and client facades.

// self
use crate::_prelude::*;

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
///
/// Every variant is cheap to clone so a single token refresh outcome can be handed to all
/// callers waiting on it.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure that outlived the retry budget.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Successful response whose payload does not match the wire contract.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Refresh token rejected, or an access token rejected again after a forced refresh.
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Upstream- or SDK-supplied reason string.
		reason: String,
	},
	/// The auth endpoint declined to mint a new access token, typically because refreshes
	/// were requested too frequently.
	#[error("Auth endpoint refused to issue an access token: {reason}.")]
	RefreshDenied {
		/// Upstream-supplied reason string.
		reason: String,
	},
	/// A product with the same identifier is already registered.
	#[error("Product `{product_id}` is already registered.")]
	ProductAlreadyExists {
		/// Identifier sent with the registration.
		product_id: Uuid,
	},
	/// The requested product is unknown to the service.
	#[error("Product `{product_id}` was not found.")]
	ProductNotFound {
		/// Identifier used for the lookup.
		product_id: Uuid,
	},
	/// The service rejected the request payload.
	#[error("Request failed validation: {detail}.")]
	Validation {
		/// Raw validation detail returned by the service.
		detail: String,
	},
	/// Any other non-success status.
	#[error("API request failed with HTTP {status}.")]
	Api {
		/// HTTP status code returned by the service.
		status: u16,
		/// Response body, decoded lossily as UTF-8.
		body: String,
	},
}
impl Error {
	/// Returns `true` for failures caused by rejected credentials.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication { .. } | Self::RefreshDenied { .. })
	}

	/// Returns `true` when the failure came from a timeout, a connection problem, or a 5xx.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transient(_))
	}

	/// HTTP status associated with the failure, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::ProductAlreadyExists { .. } => Some(409),
			Self::ProductNotFound { .. } => Some(404),
			Self::Validation { .. } => Some(422),
			Self::Api { status, .. } => Some(*status),
			Self::Transient(TransientError::UpstreamStatus { status, .. }) => Some(*status),
			Self::Decode(DecodeError::Json { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised while building or running a client.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed.")]
	HttpRequest {
		/// Underlying request builder failure.
		#[source]
		source: Arc<oauth2::http::Error>,
	},
	/// Runtime backing the blocking client could not be started.
	#[error("Blocking runtime could not be started.")]
	Runtime {
		/// Underlying runtime builder failure.
		#[source]
		source: Arc<std::io::Error>,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},

	/// Refresh token is empty.
	#[error("A refresh token must be provided.")]
	EmptyRefreshToken,
	/// A required environment variable is absent.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Name of the missing variable.
		name: &'static str,
	},
	/// Retry policy allows no attempt at all.
	#[error("At least one request attempt must be allowed.")]
	ZeroAttempts,
	/// Access token TTL must be positive.
	#[error("The token TTL must be positive.")]
	NonPositiveTokenTtl,
	/// Offers cache TTL must not be negative.
	#[error("The offers cache TTL must not be negative.")]
	NegativeOffersTtl,
	/// Request timeout must be positive.
	#[error("The request timeout must be positive.")]
	InvalidTimeout,
	/// Backoff delays are negative or inverted.
	#[error("Backoff delays must be non-negative and the maximum must not be below the base.")]
	InvalidBackoff,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}
impl From<std::io::Error> for ConfigError {
	fn from(e: std::io::Error) -> Self {
		Self::Runtime { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
///
/// `attempts` records how many requests were sent before the failure surfaced; transport
/// mappers report `1` and the dispatcher overwrites it once retries are exhausted.
#[derive(Clone, Debug, ThisError)]
pub enum TransientError {
	/// Service answered with a 5xx status.
	#[error("Service returned HTTP {status} after {attempts} attempt(s): {message}.")]
	UpstreamStatus {
		/// HTTP status code.
		status: u16,
		/// Response body, decoded lossily as UTF-8.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Number of attempts made.
		attempts: u32,
	},
	/// Request did not complete before the transport's deadline.
	#[error("Request timed out after {attempts} attempt(s).")]
	Timeout {
		/// Number of attempts made.
		attempts: u32,
	},
	/// Connection-level failure (DNS, TCP, TLS, reset).
	#[error("Network error occurred after {attempts} attempt(s).")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
		/// Number of attempts made.
		attempts: u32,
	},
	/// Transport failure that only carries a message.
	#[error("HTTP client error occurred after {attempts} attempt(s): {message}.")]
	Transport {
		/// Transport-supplied description.
		message: String,
		/// Number of attempts made.
		attempts: u32,
	},
}
impl TransientError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src), attempts: 1 }
	}

	/// Builds a timeout failure for a single attempt.
	pub fn timeout() -> Self {
		Self::Timeout { attempts: 1 }
	}

	/// Builds a message-only transport failure for a single attempt.
	pub fn transport(message: impl Into<String>) -> Self {
		Self::Transport { message: message.into(), attempts: 1 }
	}

	/// Number of attempts made before this failure surfaced.
	pub fn attempts(&self) -> u32 {
		match self {
			Self::UpstreamStatus { attempts, .. }
			| Self::Timeout { attempts }
			| Self::Network { attempts, .. }
			| Self::Transport { attempts, .. } => *attempts,
		}
	}

	/// Retry-After hint supplied by the service, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::UpstreamStatus { retry_after, .. } => *retry_after,
			_ => None,
		}
	}

	pub(crate) fn with_attempts(mut self, count: u32) -> Self {
		match &mut self {
			Self::UpstreamStatus { attempts, .. }
			| Self::Timeout { attempts }
			| Self::Network { attempts, .. }
			| Self::Transport { attempts, .. } => *attempts = count,
		}

		self
	}
}

/// Payload decoding failures.
#[derive(Clone, Debug, ThisError)]
pub enum DecodeError {
	/// Response body is not the JSON shape the wire contract promises.
	#[error("Service returned malformed JSON.")]
	Json {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code of the response.
		status: u16,
	},
}
