// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by the guard pipeline.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_guard.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Emits a debug event before a retry policy sleeps and replays a request.
pub fn trace_transient_retry(attempt: u32, max_attempts: u32, delay: Duration, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			attempt,
			max_attempts,
			delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
			error_kind = err.kind().as_str(),
			"Transient failure; retrying request."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, max_attempts, delay, err);
	}
}

/// Emits an info event when the guard discards a rejected token.
pub fn trace_token_refresh(refresh: u32, max_refreshes: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(refresh, max_refreshes, "Access token rejected; refreshing.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (refresh, max_refreshes);
	}
}

/// Emits a debug event when the cache holds no token and an exchange is about to run.
pub fn trace_cache_miss(cache_key: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(cache_key, "No cached access token; acquiring a new one.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = cache_key;
	}
}

/// Emits a warning event for a failure propagated back to the caller.
pub fn trace_flow_failure(kind: FlowKind, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			flow = kind.as_str(),
			error_kind = err.kind().as_str(),
			status = err.status(),
			"{err}"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, err);
	}
}
