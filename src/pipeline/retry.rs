//! Bounded retry with exponential backoff for transient failures.

// crates.io
use rand::Rng;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HeaderMap, oauth2::http::header::RETRY_AFTER},
};

/// Retry budget applied to every outbound call.
///
/// `max_attempts` counts the first try. The wait before retry `n` is drawn from
/// `[d / 2, d]` where `d = min(base_delay * 2^(n - 1), max_delay)`. A `Retry-After` hint from
/// the service replaces the computed delay, still capped by `max_delay`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	max_attempts: u32,
	base_delay: Duration,
	max_delay: Duration,
}
impl RetryPolicy {
	/// Attempts made per call unless configured otherwise.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
	/// First backoff delay unless configured otherwise.
	pub const DEFAULT_BASE_DELAY: Duration = Duration::milliseconds(200);
	/// Backoff ceiling unless configured otherwise.
	pub const DEFAULT_MAX_DELAY: Duration = Duration::seconds(5);

	/// Builds a validated policy.
	pub fn new(
		max_attempts: u32,
		base_delay: Duration,
		max_delay: Duration,
	) -> Result<Self, ConfigError> {
		if max_attempts == 0 {
			return Err(ConfigError::ZeroAttempts);
		}
		if base_delay.is_negative() || max_delay < base_delay {
			return Err(ConfigError::InvalidBackoff);
		}

		Ok(Self { max_attempts, base_delay, max_delay })
	}

	/// Total attempts, including the first.
	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Delay before the first retry, before jitter.
	pub fn base_delay(&self) -> Duration {
		self.base_delay
	}

	/// Upper bound for any single wait.
	pub fn max_delay(&self) -> Duration {
		self.max_delay
	}

	/// Wait applied after `failed_attempts` attempts have failed.
	pub fn delay_for(&self, failed_attempts: u32, retry_after: Option<Duration>) -> Duration {
		if let Some(hint) = retry_after {
			return hint.clamp(Duration::ZERO, self.max_delay);
		}

		let base_ms = clamp_millis(self.base_delay);
		let cap_ms = clamp_millis(self.max_delay);
		let exponent = failed_attempts.saturating_sub(1).min(32);
		let ceiling = base_ms.saturating_mul(1_u64 << exponent).min(cap_ms);
		let floor = ceiling / 2;
		let jittered =
			if ceiling > floor { rand::rng().random_range(floor..=ceiling) } else { ceiling };

		Duration::milliseconds(jittered as i64)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			base_delay: Self::DEFAULT_BASE_DELAY,
			max_delay: Self::DEFAULT_MAX_DELAY,
		}
	}
}

fn clamp_millis(duration: Duration) -> u64 {
	u64::try_from(duration.whole_milliseconds()).unwrap_or(0).min(i64::MAX as u64)
}

/// Reads a `Retry-After` header given either in seconds or as an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs.min(i64::MAX as u64) as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::HeaderValue;

	#[test]
	fn new_rejects_invalid_budgets() {
		assert!(matches!(
			RetryPolicy::new(0, Duration::ZERO, Duration::ZERO),
			Err(ConfigError::ZeroAttempts)
		));
		assert!(matches!(
			RetryPolicy::new(3, Duration::seconds(2), Duration::seconds(1)),
			Err(ConfigError::InvalidBackoff)
		));
		assert!(matches!(
			RetryPolicy::new(3, Duration::milliseconds(-1), Duration::seconds(1)),
			Err(ConfigError::InvalidBackoff)
		));
	}

	#[test]
	fn backoff_grows_within_jitter_bounds() {
		let policy = RetryPolicy::default();

		for _ in 0..32 {
			let first = policy.delay_for(1, None);
			let second = policy.delay_for(2, None);
			let late = policy.delay_for(30, None);

			assert!(first >= Duration::milliseconds(100) && first <= Duration::milliseconds(200));
			assert!(second >= Duration::milliseconds(200) && second <= Duration::milliseconds(400));
			assert!(late >= Duration::milliseconds(2_500) && late <= Duration::seconds(5));
		}
	}

	#[test]
	fn zero_base_never_waits() {
		let policy = RetryPolicy::new(5, Duration::ZERO, Duration::ZERO)
			.expect("Zero backoff should be accepted.");

		assert_eq!(policy.delay_for(4, None), Duration::ZERO);
	}

	#[test]
	fn retry_after_hint_is_capped() {
		let policy = RetryPolicy::default();

		assert_eq!(policy.delay_for(1, Some(Duration::seconds(2))), Duration::seconds(2));
		assert_eq!(policy.delay_for(1, Some(Duration::minutes(10))), Duration::seconds(5));
	}

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(7)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}
}
