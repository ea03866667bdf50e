// self
use crate::{
	_prelude::*,
	error::TransientError,
	obs::{CacheOutcome, CallKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by SDK operations.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("offers_sdk.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn retry_scheduled(
	kind: CallKind,
	attempt: u32,
	delay: Duration,
	failure: &TransientError,
) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			call = kind.as_str(),
			attempt,
			delay_ms = delay.whole_milliseconds() as u64,
			error = %failure,
			"transient failure, retrying"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, attempt, delay, failure);
	}
}

pub(crate) fn access_token_rejected(kind: CallKind) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(call = kind.as_str(), "access token rejected, forcing a refresh");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = kind;
	}
}

pub(crate) fn token_refreshed(fingerprint: &str, refresh_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(refresh_token = fingerprint, %refresh_at, "access token refreshed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (fingerprint, refresh_at);
	}
}

pub(crate) fn hook_panicked(index: usize, callback: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(hook = index, callback, "request hook panicked, skipping it");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (index, callback);
	}
}

pub(crate) fn cache_decision(outcome: CacheOutcome, product_id: Uuid) {
	#[cfg(feature = "tracing")]
	{
		tracing::trace!(outcome = outcome.as_str(), %product_id, "offers cache lookup");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, product_id);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::GetOffers, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
