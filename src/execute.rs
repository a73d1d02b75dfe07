//! Probe execution under a deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::check::{Check, CheckState};

/// Sentinel error text recorded when a probe's deadline fires.
pub(crate) const TIMEOUT_ERROR: &str = "check timed out";

/// Run one probe under `effective_timeout` and fold the outcome into a
/// new state.
///
/// A deadline overrun always yields the uniform [`TIMEOUT_ERROR`],
/// regardless of what the probe would eventually have returned. The probe
/// error itself is data folded into the state, never propagated.
pub(crate) async fn execute_check(
    check: &Check,
    state: CheckState,
    effective_timeout: Duration,
) -> CheckState {
    let probe = check.run_probe();
    let result = match tokio::time::timeout(effective_timeout, probe).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(TIMEOUT_ERROR)),
    };
    fold_result(state, result)
}

/// Fold a probe outcome into the check's new state.
///
/// `last_checked_at` advances on every execution; `last_success_at` only
/// on success; `started_at` is preserved. All timestamps are UTC so that
/// comparisons and serialized output stay deterministic.
pub(crate) fn fold_result(mut state: CheckState, result: anyhow::Result<()>) -> CheckState {
    let now = Utc::now();
    state.last_checked_at = Some(now);
    match result {
        Ok(()) => {
            state.last_success_at = Some(now);
            state.consecutive_fails = 0;
            state.last_result = None;
        }
        Err(err) => {
            state.consecutive_fails = state.consecutive_fails.saturating_add(1);
            state.last_result = Some(Arc::new(err));
        }
    }
    state
}
