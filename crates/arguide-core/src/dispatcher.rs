/*
[INPUT]:  User-triggered manager commands as async actions
[OUTPUT]: Busy indicator signalling and uniform failure reporting
[POS]:    Command layer - wraps every manager call made from a UI control
[UPDATE]: 2026-10-13 Count in-flight actions so overlapping commands share one busy span
[UPDATE]: 2026-10-14 Report panics in actions as failures instead of unwinding into the UI loop
[UPDATE]: 2026-10-16 Report locally rejected commands to the sink
*/

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::UiError;
use crate::manager::CommandKind;

/// Destination for dispatched-command outcomes.
pub trait ObservabilitySink: Send + Sync {
    fn report_failure(&self, command: CommandKind, error: &anyhow::Error);

    fn record_completion(&self, _command: CommandKind, _elapsed: Duration) {}
}

/// Sink that writes outcomes to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn report_failure(&self, command: CommandKind, error: &anyhow::Error) {
        error!(command = %command, error = %format!("{error:#}"), "dispatched command failed");
    }

    fn record_completion(&self, command: CommandKind, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        debug!(command = %command, elapsed_ms = ms, "dispatched command completed");
    }
}

#[derive(Debug)]
struct BusyInner {
    in_flight: Mutex<usize>,
    visible: watch::Sender<bool>,
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

/// Process-wide busy indicator. Only [`CommandDispatcher`] switches it.
///
/// Visible while at least one dispatched action is pending.
#[derive(Debug, Clone)]
pub struct BusyIndicator {
    inner: Arc<BusyInner>,
}

impl BusyIndicator {
    fn new() -> Self {
        let (visible, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(BusyInner {
                in_flight: Mutex::new(0),
                visible,
                shown: AtomicUsize::new(0),
                hidden: AtomicUsize::new(0),
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        *self.inner.visible.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }

    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of off -> on switches so far.
    pub fn times_shown(&self) -> usize {
        self.inner.shown.load(Ordering::SeqCst)
    }

    /// Number of on -> off switches so far.
    pub fn times_hidden(&self) -> usize {
        self.inner.hidden.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> BusyGuard {
        let mut in_flight = self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight += 1;
        if *in_flight == 1 {
            self.inner.shown.fetch_add(1, Ordering::SeqCst);
            self.inner.visible.send_replace(true);
        }
        BusyGuard {
            indicator: self.clone(),
        }
    }

    fn release(&self) {
        let mut in_flight = self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.inner.hidden.fetch_add(1, Ordering::SeqCst);
            self.inner.visible.send_replace(false);
        }
    }
}

/// Holds the indicator on; releases on drop, unwinding included.
struct BusyGuard {
    indicator: BusyIndicator,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.release();
    }
}

/// Runs manager commands with busy signalling and failure reporting.
///
/// There is no queue or lock: overlapping dispatches run concurrently and
/// callers that need ordering must serialize themselves.
#[derive(Clone)]
pub struct CommandDispatcher {
    busy: BusyIndicator,
    sink: Arc<dyn ObservabilitySink>,
}

impl CommandDispatcher {
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self {
            busy: BusyIndicator::new(),
            sink,
        }
    }

    pub fn with_tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    /// Report a command refused before dispatch. The busy indicator is untouched.
    pub fn report_rejection(&self, command: CommandKind, error: &UiError) {
        warn!(command = %command, error = %error, "command rejected locally");
        self.sink
            .report_failure(command, &anyhow::Error::new(error.clone()));
    }

    /// Show the busy indicator, run `action`, hide it once the action settles.
    ///
    /// The handle resolves to `true` on success. Failures, including panics in
    /// either the closure or its future, go to the sink and resolve to `false`.
    /// Must be called from within a Tokio runtime.
    pub fn dispatch<F, Fut>(&self, command: CommandKind, action: F) -> JoinHandle<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let guard = self.busy.acquire();
        let started = Instant::now();
        debug!(command = %command, "dispatching command");

        let future = match panic::catch_unwind(AssertUnwindSafe(action)) {
            Ok(future) => future,
            Err(payload) => {
                let err = anyhow!("{command} panicked: {}", panic_message(payload.as_ref()));
                self.sink.report_failure(command, &err);
                drop(guard);
                return tokio::spawn(async { false });
            }
        };

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let _guard = guard;
            let outcome = match tokio::spawn(future).await {
                Ok(result) => result,
                Err(join_err) if join_err.is_panic() => {
                    let payload = join_err.into_panic();
                    Err(anyhow!("{command} panicked: {}", panic_message(payload.as_ref())))
                }
                Err(join_err) => Err(anyhow!("{command} was cancelled: {join_err}")),
            };

            match outcome {
                Ok(()) => {
                    sink.record_completion(command, started.elapsed());
                    true
                }
                Err(err) => {
                    sink.report_failure(command, &err);
                    false
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
