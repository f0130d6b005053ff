//! Optional observability helpers for the sign-in flow.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `xenforo_auth.flow` with a `stage` field, plus WARN
//!   events whenever a provider call fails and the flow continues with a degraded result.
//! - `metrics` increments the `xenforo_auth_flow_total` counter for every
//!   attempt/success/degraded/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages of the sign-in flow observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Building the authorization redirect.
	Authorize,
	/// Trading the authorization code for tokens.
	TokenExchange,
	/// Best-effort profile lookup performed right after the token exchange.
	OpportunisticProfile,
	/// Profile lookup performed when the opportunistic one produced nothing.
	FallbackProfile,
	/// Whole callback pipeline, from redirect parameters to a signed session.
	SignIn,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::Authorize => "authorize",
			FlowStage::TokenExchange => "token_exchange",
			FlowStage::OpportunisticProfile => "opportunistic_profile",
			FlowStage::FallbackProfile => "fallback_profile",
			FlowStage::SignIn => "sign_in",
		}
	}
}
impl Display for FlowStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure absorbed by the flow; a default value was used instead.
	Degraded,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Degraded => "degraded",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the final outcome of a stage and logs failures.
pub fn record_result<T>(stage: FlowStage, result: &Result<T>) {
	match result {
		Ok(_) => record_flow_outcome(stage, FlowOutcome::Success),
		Err(e) => {
			log_failure(stage, e);
			record_flow_outcome(stage, FlowOutcome::Failure);
		},
	}
}

/// Audits a failure the flow deliberately absorbs.
pub fn record_degraded(stage: FlowStage, reason: &dyn Display) {
	log_degraded(stage, reason);
	record_flow_outcome(stage, FlowOutcome::Degraded);
}
