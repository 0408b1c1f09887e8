// self
use crate::obs::{CacheOutcome, CallKind, CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"yuntan_gateway_call_total",
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

/// Records a secret cache lookup via the global metrics recorder (when enabled).
pub fn record_secret_cache(outcome: CacheOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("yuntan_gateway_secret_cache_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
