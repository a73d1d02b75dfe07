//! The checker: owns check state, the cache and the scheduler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::check::{Check, CheckListener, CheckState};
use crate::execute::{self, execute_check};
use crate::interceptor::{Interceptor, Next, ProbeRunner};
use crate::scheduler::{Scheduler, TickFn};
use crate::status::{aggregate_status, error_description, AggregatedResult, CheckResult, Status};
use crate::tolerance::evaluate_availability;

/// Global status transition callback: `(status, per-check results)`.
pub type StatusListener = Arc<dyn Fn(Status, &HashMap<String, CheckResult>) + Send + Sync>;

/// Validated checker configuration, immutable after construction.
pub(crate) struct CheckerConfig {
    pub(crate) timeout: Duration,
    pub(crate) cache_ttl: Duration,
    pub(crate) max_err_msg_len: usize,
    pub(crate) detail_enabled: bool,
    pub(crate) manual_start: bool,
    pub(crate) checks: Vec<Arc<Check>>,
    pub(crate) interceptors: Vec<Arc<dyn Interceptor>>,
    pub(crate) status_listeners: Vec<StatusListener>,
}

/// The front door of the library.
///
/// Owns the configured checks, their execution state, the result cache
/// and the periodic scheduler. Cheap to clone; clones share the same
/// underlying state, so one checker can serve many concurrent endpoint
/// requests.
///
/// Built via [`HealthCheckerBuilder`](crate::HealthCheckerBuilder).
#[derive(Clone)]
pub struct Checker {
    shared: Arc<Shared>,
}

struct Shared {
    config: CheckerConfig,
    inner: Mutex<Inner>,
}

/// Everything guarded by the checker-wide lock. The lock is held only
/// around state and cache reads/writes, never across probe execution or
/// listener invocation.
struct Inner {
    states: HashMap<String, CheckState>,
    reported: HashMap<String, Status>,
    overall: Status,
    cache: ResultCache,
    scheduler: Option<Scheduler>,
}

/// Status transitions collected under the lock, fired after release.
struct Transitions {
    per_check: Vec<(CheckListener, String, Status, Status)>,
    global_changed: bool,
    status: Status,
    results: HashMap<String, CheckResult>,
}

impl Checker {
    /// Construct a checker. Unless manual start is configured, periodic
    /// workers are spawned immediately, so construction must happen
    /// inside a Tokio runtime when periodic checks are present.
    pub(crate) fn new(config: CheckerConfig) -> Self {
        let states = config
            .checks
            .iter()
            .map(|c| (c.name().to_string(), CheckState::new()))
            .collect();
        let reported = config
            .checks
            .iter()
            .map(|c| (c.name().to_string(), Status::Unknown))
            .collect();
        let cache = ResultCache::new(config.cache_ttl);
        let manual_start = config.manual_start;

        let checker = Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(Inner {
                    states,
                    reported,
                    overall: Status::Unknown,
                    cache,
                    scheduler: None,
                }),
            }),
        };
        if !manual_start {
            checker.start();
        }
        checker
    }

    /// Return a snapshot of the current system health.
    ///
    /// On-demand checks run concurrently under the global timeout (and
    /// their per-check timeouts); periodic checks contribute their last
    /// known state without re-executing. A cached aggregate within its
    /// TTL is returned directly.
    pub async fn check(&self) -> AggregatedResult {
        let pending: Vec<(Arc<Check>, CheckState)> = {
            let inner = self.shared.inner.lock().unwrap();
            if let Some(hit) = inner.cache.get() {
                return hit;
            }
            self.shared
                .config
                .checks
                .iter()
                .filter(|check| !check.is_periodic())
                .map(|check| {
                    let state = inner.states[check.name()].clone();
                    (Arc::clone(check), state)
                })
                .collect()
        };

        let fresh = self.run_pending(&pending).await;

        let (result, transitions) = {
            let mut inner = self.shared.inner.lock().unwrap();
            for (name, state) in fresh {
                inner.states.insert(name, state);
            }
            refresh_aggregate(&self.shared.config, &mut inner)
        };
        fire_listeners(&self.shared.config, transitions);
        result
    }

    /// Fan out one task per on-demand check, collect results under the
    /// global deadline, and record stragglers as timed out.
    async fn run_pending(
        &self,
        pending: &[(Arc<Check>, CheckState)],
    ) -> HashMap<String, CheckState> {
        let mut fresh = HashMap::with_capacity(pending.len());
        if pending.is_empty() {
            return fresh;
        }

        let global_timeout = self.shared.config.timeout;
        let (tx, mut rx) = mpsc::channel(pending.len());
        let mut handles = Vec::with_capacity(pending.len());
        for (check, state) in pending {
            let tx = tx.clone();
            let shared = Arc::clone(&self.shared);
            let check = Arc::clone(check);
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                let effective = check.timeout().map_or(global_timeout, |t| t.min(global_timeout));
                let new_state = run_intercepted(&shared, &check, state, effective).await;
                let _ = tx.send((check.name().to_string(), new_state)).await;
            }));
        }
        drop(tx);

        let deadline = tokio::time::sleep(global_timeout);
        tokio::pin!(deadline);
        let mut remaining = pending.len();
        while remaining > 0 {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((name, state)) => {
                        fresh.insert(name, state);
                        remaining -= 1;
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    warn!(unfinished = remaining, "global timeout elapsed before all checks reported");
                    break;
                }
            }
        }
        for handle in handles {
            handle.abort();
        }

        // Checks that never reported are recorded with the timeout error.
        for (check, state) in pending {
            if !fresh.contains_key(check.name()) {
                let timed_out = execute::fold_result(
                    state.clone(),
                    Err(anyhow::anyhow!(execute::TIMEOUT_ERROR)),
                );
                fresh.insert(check.name().to_string(), timed_out);
            }
        }
        fresh
    }

    /// Start the periodic workers. A no-op when already started.
    pub fn start(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.scheduler.is_some() {
            return;
        }

        let mut scheduler = Scheduler::new();
        for check in self.shared.config.checks.iter().filter(|c| c.is_periodic()) {
            let Some(interval) = check.refresh_interval() else {
                continue;
            };
            let shared = Arc::clone(&self.shared);
            let worker_check = Arc::clone(check);
            let tick: TickFn = Box::new(move || {
                let shared = Arc::clone(&shared);
                let check = Arc::clone(&worker_check);
                Box::pin(async move {
                    run_periodic_tick(shared, check).await;
                })
            });
            scheduler.spawn_worker(check.name().to_string(), check.initial_delay(), interval, tick);
        }
        debug!(workers = scheduler.worker_count(), "periodic checks started");
        inner.scheduler = Some(scheduler);
    }

    /// Stop the periodic workers and wait until all of them have exited.
    /// A no-op when already stopped.
    pub async fn stop(&self) {
        let workers = {
            let mut inner = self.shared.inner.lock().unwrap();
            match inner.scheduler.take() {
                Some(scheduler) => scheduler.begin_shutdown(),
                None => return,
            }
        };
        for handle in workers {
            let _ = handle.await;
        }
        debug!("periodic checks stopped");
    }

    /// Whether periodic workers are currently running.
    pub fn is_started(&self) -> bool {
        self.shared.inner.lock().unwrap().scheduler.is_some()
    }

    /// Number of live periodic workers.
    pub fn periodic_worker_count(&self) -> usize {
        self.shared
            .inner
            .lock()
            .unwrap()
            .scheduler
            .as_ref()
            .map_or(0, Scheduler::worker_count)
    }
}

/// One background execution of a periodic check: run the probe without
/// the lock, then fold the state, refresh the aggregate and the cache,
/// and fire listeners on transition.
async fn run_periodic_tick(shared: Arc<Shared>, check: Arc<Check>) {
    let state = {
        let inner = shared.inner.lock().unwrap();
        inner.states[check.name()].clone()
    };
    let effective = check.timeout().unwrap_or(shared.config.timeout);
    let new_state = run_intercepted(&shared, &check, state, effective).await;

    let (_, transitions) = {
        let mut inner = shared.inner.lock().unwrap();
        inner.states.insert(check.name().to_string(), new_state);
        refresh_aggregate(&shared.config, &mut inner)
    };
    fire_listeners(&shared.config, transitions);
}

/// Run one check through the interceptor chain with the executor as the
/// innermost layer.
async fn run_intercepted(
    shared: &Shared,
    check: &Arc<Check>,
    state: CheckState,
    effective_timeout: Duration,
) -> CheckState {
    let probe_check = Arc::clone(check);
    let terminal: Box<ProbeRunner> = Box::new(move |state| {
        let check = Arc::clone(&probe_check);
        Box::pin(async move { execute_check(&check, state, effective_timeout).await })
    });
    Next::new(&shared.config.interceptors, &*terminal)
        .proceed(check.name(), state)
        .await
}

/// Recompute every check's reported status, the aggregate and the cache.
/// Called with the lock held; returns the transitions to fire after it is
/// released.
fn refresh_aggregate(config: &CheckerConfig, inner: &mut Inner) -> (AggregatedResult, Transitions) {
    let mut results = HashMap::with_capacity(config.checks.len());
    let mut per_check = Vec::new();

    for check in &config.checks {
        let state = &inner.states[check.name()];
        let status = evaluate_availability(
            state,
            check.max_time_in_error(),
            check.max_consecutive_fails(),
        );
        let previous = inner
            .reported
            .insert(check.name().to_string(), status)
            .unwrap_or(Status::Unknown);
        if previous != status {
            debug!(check = check.name(), from = %previous, to = %status, "check status changed");
            if let Some(listener) = check.status_listener() {
                per_check.push((listener, check.name().to_string(), previous, status));
            }
        }
        results.insert(
            check.name().to_string(),
            CheckResult {
                status,
                timestamp: state.last_checked_at,
                error: error_description(state.last_result.as_deref(), config.max_err_msg_len),
            },
        );
    }

    let status = aggregate_status(&results);
    let global_changed = inner.overall != status;
    inner.overall = status;

    let details = config.detail_enabled.then(|| results.clone());
    let result = AggregatedResult { status, details };
    inner.cache.put(&result);

    let transitions = Transitions {
        per_check,
        global_changed,
        status,
        results,
    };
    (result, transitions)
}

/// Invoke listeners synchronously, after the checker lock is released.
/// Listeners receive statuses and results, never state back-pointers, so
/// they cannot re-enter the checker.
fn fire_listeners(config: &CheckerConfig, transitions: Transitions) {
    for (listener, name, previous, current) in transitions.per_check {
        (listener.as_ref())(&name, previous, current);
    }
    if transitions.global_changed {
        for listener in &config.status_listeners {
            (listener.as_ref())(transitions.status, &transitions.results);
        }
    }
}
