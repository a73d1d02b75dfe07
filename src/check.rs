//! Check descriptors and per-check state.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

use crate::status::Status;

/// Boxed future returned by a probe function.
pub type CheckFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A probe function testing one dependency.
///
/// The returned future must be cancellation-safe: when the effective
/// deadline fires, the future is dropped and the check is recorded as
/// timed out.
pub type CheckFn = Arc<dyn Fn() -> CheckFuture + Send + Sync>;

/// Per-check status transition callback: `(name, old, new)`.
pub type CheckListener = Arc<dyn Fn(&str, Status, Status) + Send + Sync>;

/// Immutable declaration of a single health check.
///
/// A check is either *on-demand* (executed on every [`Checker::check`]
/// invocation, subject to the result cache) or *periodic* (executed in the
/// background on a fixed interval). Periodic scheduling is configured via
/// [`HealthCheckerBuilder::periodic_check`].
///
/// [`Checker::check`]: crate::Checker::check
/// [`HealthCheckerBuilder::periodic_check`]: crate::HealthCheckerBuilder::periodic_check
pub struct Check {
    name: String,
    check: CheckFn,
    timeout: Option<Duration>,
    refresh_interval: Option<Duration>,
    initial_delay: Option<Duration>,
    max_time_in_error: Option<Duration>,
    max_consecutive_fails: Option<u32>,
    status_listener: Option<CheckListener>,
}

impl Check {
    /// Create a check with the given name and probe function.
    pub fn new<F, Fut>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(move || Box::pin(check())),
            timeout: None,
            refresh_interval: None,
            initial_delay: None,
            max_time_in_error: None,
            max_consecutive_fails: None,
            status_listener: None,
        }
    }

    /// Set a per-check timeout overriding the checker's global timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Tolerate errors until the time since the last success exceeds
    /// this threshold (strictly).
    pub fn with_max_time_in_error(mut self, max: Duration) -> Self {
        self.max_time_in_error = Some(max);
        self
    }

    /// Tolerate errors until the consecutive failure count exceeds this
    /// threshold (strictly).
    pub fn with_max_consecutive_fails(mut self, max: u32) -> Self {
        self.max_consecutive_fails = Some(max);
        self
    }

    /// Install a listener fired when this check's reported status changes.
    pub fn with_status_listener<L>(mut self, listener: L) -> Self
    where
        L: Fn(&str, Status, Status) + Send + Sync + 'static,
    {
        self.status_listener = Some(Arc::new(listener));
        self
    }

    /// The unique name of this check.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this check runs on a background schedule.
    pub fn is_periodic(&self) -> bool {
        self.refresh_interval.is_some()
    }

    pub(crate) fn set_periodic(&mut self, interval: Duration, initial_delay: Option<Duration>) {
        self.refresh_interval = Some(interval);
        self.initial_delay = initial_delay;
    }

    /// Invoke the probe, producing a fresh future for one execution.
    pub(crate) fn run_probe(&self) -> CheckFuture {
        (self.check.as_ref())()
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }

    pub(crate) fn initial_delay(&self) -> Option<Duration> {
        self.initial_delay
    }

    pub(crate) fn max_time_in_error(&self) -> Option<Duration> {
        self.max_time_in_error
    }

    pub(crate) fn max_consecutive_fails(&self) -> Option<u32> {
        self.max_consecutive_fails
    }

    pub(crate) fn status_listener(&self) -> Option<CheckListener> {
        self.status_listener.clone()
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("refresh_interval", &self.refresh_interval)
            .field("initial_delay", &self.initial_delay)
            .field("max_time_in_error", &self.max_time_in_error)
            .field("max_consecutive_fails", &self.max_consecutive_fails)
            .finish()
    }
}

/// Mutable execution record tracked per check.
///
/// Interceptors observe and may rewrite this state; listeners only ever
/// receive the derived [`Status`].
#[derive(Debug, Clone)]
pub struct CheckState {
    /// Time the checker began tracking this check. Never mutated.
    pub started_at: DateTime<Utc>,
    /// Time of the last completed execution. `None` until the first one.
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Time of the last successful execution. `None` until the first
    /// success.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Error from the last execution. `None` after a success.
    pub last_result: Option<Arc<anyhow::Error>>,
    /// Uninterrupted failures since the last success.
    pub consecutive_fails: u32,
}

impl CheckState {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Utc::now(),
            last_checked_at: None,
            last_success_at: None,
            last_result: None,
            consecutive_fails: 0,
        }
    }
}
