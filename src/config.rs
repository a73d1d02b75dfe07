//! Configuration assembly for building checkers.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::check::Check;
use crate::checker::{Checker, CheckerConfig, StatusListener};
use crate::interceptor::Interceptor;
use crate::status::{CheckResult, Status};

/// Default global timeout applied to checks without their own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default TTL of the aggregate result cache.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1);
/// Default truncation limit for error text in emitted results.
const DEFAULT_MAX_ERR_MSG_LEN: usize = 500;

/// Fluent builder assembling a validated [`Checker`].
///
/// # Example
///
/// ```rust,ignore
/// use tokio_health::{Check, HealthCheckerBuilder};
/// use std::time::Duration;
///
/// let checker = HealthCheckerBuilder::new()
///     .timeout(Duration::from_secs(5))
///     .check(Check::new("database", || async { db.ping().await }))
///     .periodic_check(
///         Duration::from_secs(30),
///         None,
///         Check::new("broker", || async { broker.ping().await }),
///     )
///     .build()?;
/// ```
pub struct HealthCheckerBuilder {
    timeout: Duration,
    cache_ttl: Duration,
    max_err_msg_len: usize,
    detail_enabled: bool,
    manual_start: bool,
    checks: Vec<Check>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    status_listeners: Vec<StatusListener>,
}

impl HealthCheckerBuilder {
    /// Create a builder with default settings: 10 s global timeout, 1 s
    /// cache TTL, 500 byte error messages, details enabled, automatic
    /// periodic start.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_err_msg_len: DEFAULT_MAX_ERR_MSG_LEN,
            detail_enabled: true,
            manual_start: false,
            checks: Vec::new(),
            interceptors: Vec::new(),
            status_listeners: Vec::new(),
        }
    }

    /// Set the global timeout applied to any check without its own.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an on-demand check, executed on every [`Checker::check`] call.
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Add a periodic check executed in the background every `interval`,
    /// with an optional delay before the first execution. Queries return
    /// its last known state.
    pub fn periodic_check(
        mut self,
        interval: Duration,
        initial_delay: Option<Duration>,
        mut check: Check,
    ) -> Self {
        check.set_periodic(interval, initial_delay);
        self.checks.push(check);
        self
    }

    /// Set how long an aggregate result is served from cache.
    pub fn cache_duration(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Disable the aggregate result cache.
    pub fn disabled_cache(mut self) -> Self {
        self.cache_ttl = Duration::ZERO;
        self
    }

    /// Truncate error text in emitted results to the first `len` bytes.
    /// Zero disables truncation.
    pub fn max_error_message_length(mut self, len: usize) -> Self {
        self.max_err_msg_len = len;
        self
    }

    /// Install a listener fired whenever the aggregate status changes.
    pub fn status_listener<L>(mut self, listener: L) -> Self
    where
        L: Fn(Status, &HashMap<String, CheckResult>) + Send + Sync + 'static,
    {
        self.status_listeners.push(Arc::new(listener));
        self
    }

    /// Defer starting periodic workers until [`Checker::start`].
    pub fn manual_periodic_check_start(mut self) -> Self {
        self.manual_start = true;
        self
    }

    /// Alias for [`manual_periodic_check_start`].
    ///
    /// [`manual_periodic_check_start`]: Self::manual_periodic_check_start
    pub fn disabled_autostart(self) -> Self {
        self.manual_periodic_check_start()
    }

    /// Suppress the `details` map in emitted results.
    pub fn disabled_details(mut self) -> Self {
        self.detail_enabled = false;
        self
    }

    /// Append an interceptor wrapping every probe execution. Interceptors
    /// run in the order they were added, outermost first.
    pub fn interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append a list of interceptors, preserving order.
    pub fn interceptors(mut self, interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        self.interceptors.extend(interceptors);
        self
    }

    /// Validate the configuration and construct the checker.
    ///
    /// Unless manual start was requested, periodic workers are spawned
    /// here, so with periodic checks this must be called inside a Tokio
    /// runtime.
    pub fn build(self) -> Result<Checker, ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidGlobalTimeout);
        }

        let mut names = HashSet::new();
        for check in &self.checks {
            if check.name().is_empty() {
                return Err(ConfigError::EmptyCheckName);
            }
            if !names.insert(check.name().to_string()) {
                return Err(ConfigError::DuplicateCheckName {
                    name: check.name().to_string(),
                });
            }
            if check.timeout().is_some_and(|t| t.is_zero()) {
                return Err(ConfigError::InvalidTimeout {
                    name: check.name().to_string(),
                });
            }
            if check.refresh_interval().is_some_and(|i| i.is_zero()) {
                return Err(ConfigError::InvalidRefreshInterval {
                    name: check.name().to_string(),
                });
            }
        }

        Ok(Checker::new(CheckerConfig {
            timeout: self.timeout,
            cache_ttl: self.cache_ttl,
            max_err_msg_len: self.max_err_msg_len,
            detail_enabled: self.detail_enabled,
            manual_start: self.manual_start,
            checks: self.checks.into_iter().map(Arc::new).collect(),
            interceptors: self.interceptors,
            status_listeners: self.status_listeners,
        }))
    }
}

impl Default for HealthCheckerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised when checker options are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The global timeout must be positive.
    InvalidGlobalTimeout,
    /// A check was declared with an empty name.
    EmptyCheckName,
    /// Two checks share the same name.
    DuplicateCheckName { name: String },
    /// A per-check timeout must be positive.
    InvalidTimeout { name: String },
    /// A refresh interval must be positive.
    InvalidRefreshInterval { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidGlobalTimeout => {
                write!(f, "global timeout must be positive")
            }
            ConfigError::EmptyCheckName => {
                write!(f, "check name must not be empty")
            }
            ConfigError::DuplicateCheckName { name } => {
                write!(f, "duplicate check name: {}", name)
            }
            ConfigError::InvalidTimeout { name } => {
                write!(f, "timeout for check '{}' must be positive", name)
            }
            ConfigError::InvalidRefreshInterval { name } => {
                write!(f, "refresh interval for check '{}' must be positive", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
