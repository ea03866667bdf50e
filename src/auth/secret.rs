//! Redacting wrappers for credential material.

// std
use std::sync::OnceLock;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::ConfigError};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Long-lived credential exchanged for access tokens.
///
/// The value is fixed for the lifetime of a client. [`fingerprint`](Self::fingerprint) yields a
/// base64 (no padding) SHA-256 digest that is safe to log and lets operators correlate
/// refreshes without ever printing the secret.
pub struct RefreshToken {
	secret: TokenSecret,
	fingerprint_cache: OnceLock<String>,
}
impl RefreshToken {
	/// Wraps a refresh token, rejecting empty or whitespace-only values.
	pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(ConfigError::EmptyRefreshToken);
		}

		Ok(Self { secret: TokenSecret::new(value), fingerprint_cache: OnceLock::new() })
	}

	/// Returns the raw token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.secret.expose()
	}

	/// Stable, log-safe digest of the token.
	pub fn fingerprint(&self) -> &str {
		self.fingerprint_cache.get_or_init(|| {
			let mut hasher = Sha256::new();

			hasher.update(self.expose().as_bytes());

			STANDARD_NO_PAD.encode(hasher.finalize())
		})
	}
}
impl Clone for RefreshToken {
	fn clone(&self) -> Self {
		Self { secret: self.secret.clone(), fingerprint_cache: OnceLock::new() }
	}
}
impl Debug for RefreshToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshToken").field("fingerprint", &self.fingerprint()).finish()
	}
}
impl Display for RefreshToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
