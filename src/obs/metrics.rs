// self
use crate::obs::{CacheOutcome, CallKind, CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"offers_sdk_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records an offers cache decision via the global metrics recorder (when enabled).
pub fn record_cache_outcome(outcome: CacheOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("offers_sdk_cache_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_call_outcome(CallKind::GetOffers, CallOutcome::Failure);
		record_cache_outcome(CacheOutcome::Bypass);
	}
}
