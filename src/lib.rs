//! tokio_health - Async health check library for Tokio services.
//!
//! This crate lets a service declare named sub-checks for its critical
//! downstream dependencies (database reachability, message-broker
//! liveness, external API probes) and derives a single aggregate status
//! from them, ready to be served from a health endpoint.
//!
//! # Features
//!
//! - **Two execution regimes**: on-demand checks run concurrently on
//!   every query; periodic checks run on a background schedule and
//!   contribute their last known state
//! - **Timeout enforcement**: per-check and global deadlines, with a
//!   uniform "check timed out" result on overrun
//! - **Result caching**: a configurable TTL coalesces load from
//!   concurrent endpoint requests
//! - **Failure tolerance**: thresholds on consecutive failures and time
//!   in error smooth over transient faults
//! - **Status listeners**: per-check and aggregate transition callbacks
//! - **Interceptors**: composable middleware around every probe execution
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tokio_health::{Check, HealthCheckerBuilder};
//!
//! let checker = HealthCheckerBuilder::new()
//!     .timeout(Duration::from_secs(5))
//!     .check(Check::new("database", || async { db.ping().await }))
//!     .periodic_check(
//!         Duration::from_secs(30),
//!         None,
//!         Check::new("broker", || async { broker.ping().await }),
//!     )
//!     .build()?;
//!
//! let result = checker.check().await;
//! println!("{}", result.status);
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

mod cache;
mod check;
mod checker;
mod config;
mod execute;
mod interceptor;
mod scheduler;
mod status;
mod tolerance;

pub mod endpoint;

pub use check::{Check, CheckFn, CheckFuture, CheckListener, CheckState};
pub use checker::{Checker, StatusListener};
pub use config::{ConfigError, HealthCheckerBuilder};
pub use interceptor::{Interceptor, Next};
pub use status::{AggregatedResult, CheckResult, Status};
