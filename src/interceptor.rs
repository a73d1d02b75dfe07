//! Interceptors wrapping probe execution.
//!
//! Interceptors compose in declaration order, outermost first; the
//! innermost layer is always the executor. Each layer observes the check
//! name and state and may rewrite the state it passes on or receives
//! back, which is how logging, metrics and result smoothing are layered
//! onto checks without touching the probes themselves.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::check::CheckState;

/// The innermost layer of the chain: runs the probe and folds the result.
pub(crate) type ProbeRunner = dyn Fn(CheckState) -> BoxFuture<'static, CheckState> + Send + Sync;

/// Middleware wrapping the execution of a single check.
///
/// Implementations must call [`Next::proceed`] exactly once to invoke the
/// remainder of the chain, and must not retain references to the state
/// between invocations.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, name: &str, state: CheckState, next: Next<'_>) -> CheckState;
}

/// Handle to the remainder of an interceptor chain.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    terminal: &'a ProbeRunner,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Interceptor>], terminal: &'a ProbeRunner) -> Self {
        Self { chain, terminal }
    }

    /// Invoke the rest of the chain, innermost the executor itself.
    pub async fn proceed(self, name: &str, state: CheckState) -> CheckState {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    chain: rest,
                    terminal: self.terminal,
                };
                head.intercept(name, state, next).await
            }
            None => (self.terminal)(state).await,
        }
    }
}
