//! Status types, aggregation and the result document.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability status of a single check or of the whole system.
///
/// Ordered by severity so that aggregation is a plain `max`:
/// `Down > Unknown > Up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The check succeeded on its most recent execution (or is failing
    /// within its configured tolerance).
    Up,
    /// The check has never produced a result.
    Unknown,
    /// The check is failing beyond tolerance.
    Down,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Unknown => write!(f, "unknown"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Externally visible snapshot of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Reported status after tolerance evaluation.
    pub status: Status,
    /// Time of the last completed execution. `None` if never executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Truncated error text. Present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The aggregate health document returned by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// System-wide status derived from all checks by precedence.
    pub status: Status,
    /// Per-check results, keyed by check name. `None` when details are
    /// disabled in the checker configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, CheckResult>>,
}

/// Reduce per-check statuses into a single system status.
///
/// `Down` wins over `Unknown`, `Unknown` wins over `Up`. An empty input
/// yields `Up`.
pub(crate) fn aggregate_status(results: &HashMap<String, CheckResult>) -> Status {
    results
        .values()
        .map(|r| r.status)
        .max()
        .unwrap_or(Status::Up)
}

/// Render an error for the result document, truncated to `max_len` bytes.
///
/// A `max_len` of 0 disables truncation. The cut never splits a UTF-8
/// sequence; a multi-byte character straddling the limit is dropped.
pub(crate) fn error_description(err: Option<&anyhow::Error>, max_len: usize) -> Option<String> {
    err.map(|e| {
        let text = e.to_string();
        if max_len == 0 || text.len() <= max_len {
            return text;
        }
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    })
}
