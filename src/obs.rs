//! Optional observability helpers for SDK calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `offers_sdk.call` with the `call` and
//!   `stage` fields, plus events for retries, token refreshes, and cache decisions.
//! - Enable `metrics` to increment `offers_sdk_call_total` (labeled by `call` + `outcome`) for
//!   every attempt/success/failure and `offers_sdk_cache_total` (labeled by `outcome`) for
//!   every offers cache decision.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Declares a fieldless enum whose variants map onto fixed span and metric labels.
macro_rules! labels {
	(
		$(#[$meta:meta])*
		$name:ident {
			$($(#[$variant_meta:meta])* $variant:ident => $label:literal,)+
		}
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq)]
		pub enum $name {
			$($(#[$variant_meta])* $variant,)+
		}
		impl $name {
			/// Label used in span fields and metric labels.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

labels! {
	/// Remote operations issued by the SDK.
	CallKind {
		/// Refresh token exchange against the auth endpoint.
		Authenticate => "authenticate",
		/// Product registration.
		RegisterProduct => "register_product",
		/// Offers lookup.
		GetOffers => "get_offers",
	}
}

labels! {
	/// Stages of an SDK operation: entry, then exactly one terminal outcome.
	CallOutcome {
		/// Entry to an SDK operation.
		Attempt => "attempt",
		/// Successful completion.
		Success => "success",
		/// Failure propagated back to the caller.
		Failure => "failure",
	}
}
impl CallOutcome {
	/// Terminal outcome of a finished operation.
	pub fn of<T>(result: &Result<T>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}

labels! {
	/// How the offers cache answered a lookup.
	CacheOutcome {
		/// A fresh entry answered the lookup.
		Hit => "hit",
		/// No fresh entry; the service is queried.
		Miss => "miss",
		/// Caching is disabled for this client.
		Bypass => "bypass",
	}
}
