//! Background workers driving periodic checks.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// One tick of a periodic check: execute, fold state, refresh the cache.
pub(crate) type TickFn = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Owns the shutdown channel and the worker registry for one start/stop
/// cycle. A fresh `Scheduler` is built on every start so that a stopped
/// checker can be started again with a clean channel.
pub(crate) struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            shutdown_rx,
            workers: Vec::new(),
        }
    }

    /// Spawn the worker loop for one periodic check.
    ///
    /// The worker sleeps through `initial_delay`, then alternates between
    /// ticks and `interval` sleeps. Both sleeps race the shutdown channel
    /// so stopping never waits for the next tick to come around.
    pub(crate) fn spawn_worker(
        &mut self,
        name: String,
        initial_delay: Option<Duration>,
        interval: Duration,
        tick: TickFn,
    ) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            debug!(check = %name, interval_ms = interval.as_millis() as u64, "periodic worker started");

            if let Some(delay) = initial_delay.filter(|d| !d.is_zero()) {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_rx.changed() => {
                        debug!(check = %name, "periodic worker stopped before first execution");
                        return;
                    }
                }
            }

            loop {
                tick().await;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.changed() => {
                        debug!(check = %name, "periodic worker received shutdown signal");
                        break;
                    }
                }
            }
        });
        self.workers.push(handle);
    }

    /// Number of live workers in the registry.
    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Signal shutdown and hand the worker handles to the caller, which
    /// awaits them outside the checker lock.
    pub(crate) fn begin_shutdown(self) -> Vec<JoinHandle<()>> {
        let _ = self.shutdown_tx.send(true);
        self.workers
    }
}
