//! Access tokens issued by the auth endpoint.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifetime the service grants every access token.
pub const SERVER_TOKEN_LIFETIME: Duration = Duration::seconds(300);
/// Default effective lifetime; the 30 second gap keeps requests from racing server expiry.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::seconds(270);

/// Short-lived bearer credential.
///
/// A token is never patched: a refresh replaces the whole value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	secret: TokenSecret,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	refresh_at: OffsetDateTime,
}
impl AccessToken {
	/// Builds a token issued at `issued_at` and trusted for `ttl`.
	///
	/// `ttl` is clamped to [`SERVER_TOKEN_LIFETIME`] so a token is never used past the instant
	/// the service stops accepting it.
	pub fn issued(secret: TokenSecret, issued_at: OffsetDateTime, ttl: Duration) -> Self {
		let expires_at = issued_at + SERVER_TOKEN_LIFETIME;
		let refresh_at = issued_at + ttl.min(SERVER_TOKEN_LIFETIME);

		Self { secret, issued_at, expires_at, refresh_at }
	}

	/// Returns the bearer value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.secret.expose()
	}

	/// Redacted secret wrapper.
	pub fn secret(&self) -> &TokenSecret {
		&self.secret
	}

	/// Instant the token was requested.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Instant the service stops accepting the token.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Instant after which the SDK refreshes preemptively.
	pub fn refresh_at(&self) -> OffsetDateTime {
		self.refresh_at
	}

	/// Returns `true` while the token may still be sent at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.refresh_at
	}

	/// Checks validity against the current UTC instant.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
