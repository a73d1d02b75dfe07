//! Failure-tolerance evaluation.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::check::CheckState;
use crate::status::Status;

/// Map a check's state and tolerance thresholds to its reported status.
///
/// A failing check is reported `Down` only when **both** thresholds are
/// strictly crossed: `consecutive_fails > max_consecutive_fails` and
/// `now - last_success_at > max_time_in_error`. A state that exactly
/// equals a threshold is still tolerated. An unset threshold means zero
/// tolerance, so with the defaults any error reports `Down`.
pub(crate) fn evaluate_availability(
    state: &CheckState,
    max_time_in_error: Option<Duration>,
    max_consecutive_fails: Option<u32>,
) -> Status {
    if state.last_checked_at.is_none() {
        return Status::Unknown;
    }
    if state.last_result.is_none() {
        return Status::Up;
    }

    let fail_count_crossed = state.consecutive_fails > max_consecutive_fails.unwrap_or(0);
    let time_in_error_crossed = time_in_error_crossed(state.last_success_at, max_time_in_error);

    if fail_count_crossed && time_in_error_crossed {
        Status::Down
    } else {
        Status::Up
    }
}

/// A check that never succeeded counts as having crossed the time
/// threshold.
fn time_in_error_crossed(
    last_success_at: Option<DateTime<Utc>>,
    max_time_in_error: Option<Duration>,
) -> bool {
    let Some(max) = max_time_in_error else {
        return true;
    };
    let Some(last_success) = last_success_at else {
        return true;
    };
    let max = chrono::Duration::from_std(max).unwrap_or(chrono::Duration::MAX);
    Utc::now() - last_success > max
}
