//! The debounced, retrying write queue.

use crate::config::AutoSaveConfig;
use crate::connectivity::Connectivity;
use crate::error::{AutoSaveError, AutoSaveResult};
use crate::queue::{PendingQueue, QueuedOperation};
use crate::target::FlushTarget;
use rand::Rng;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What a flush attempt did, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The batch was persisted.
    Flushed { operations: usize },
    /// Nothing was pending.
    Idle,
    /// Offline; the queue is kept until connectivity returns.
    Offline,
    /// The saver was disposed.
    Disposed,
}

struct State {
    pending: PendingQueue,
    processing: bool,
    retry_attempt: u32,
    disposed: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    config: AutoSaveConfig,
    target: Arc<dyn FlushTarget>,
    connectivity: Connectivity,
    runtime: Handle,
    state: Mutex<State>,
    /// Signalled whenever an in-flight flush settles.
    settled: Notify,
}

/// Coalescing write queue in front of a [`FlushTarget`].
///
/// `queue` is synchronous and never fails; persistence errors are retried
/// and logged. Dropping the saver stops listening for connectivity but
/// lets an already scheduled flush run. Use [`AutoSaver::dispose`] to
/// discard pending work.
pub struct AutoSaver {
    inner: Arc<Inner>,
    listener: JoinHandle<()>,
}

impl AutoSaver {
    /// Creates a saver bound to the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(
        config: AutoSaveConfig,
        target: Arc<dyn FlushTarget>,
        connectivity: Connectivity,
    ) -> Self {
        let runtime = Handle::current();
        let inner = Arc::new(Inner {
            config,
            target,
            connectivity: connectivity.clone(),
            runtime: runtime.clone(),
            state: Mutex::new(State {
                pending: PendingQueue::default(),
                processing: false,
                retry_attempt: 0,
                disposed: false,
                generation: 0,
                timer: None,
            }),
            settled: Notify::new(),
        });

        let weak = Arc::downgrade(&inner);
        let mut online_rx = connectivity.subscribe();
        let listener = runtime.spawn(async move {
            while online_rx.changed().await.is_ok() {
                if !*online_rx.borrow_and_update() {
                    debug!("Went offline; pausing flushes");
                    continue;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let mut state = inner.lock();
                if !state.pending.is_empty() {
                    debug!(
                        "Back online with {} pending operation(s); flushing",
                        state.pending.len()
                    );
                    inner.schedule(&mut state, Duration::ZERO);
                }
            }
        });

        Self { inner, listener }
    }

    /// Enqueues an operation and (re)starts the debounce window.
    pub fn queue(&self, op: QueuedOperation) {
        let mut state = self.inner.lock();
        if state.disposed {
            return;
        }
        state.pending.push(op);
        if self.inner.connectivity.is_online() {
            self.inner.schedule(&mut state, self.inner.config.debounce);
        }
    }

    /// Cancels any pending timer and flushes now.
    ///
    /// When a flush is already in flight this waits for it to settle, then
    /// flushes whatever is still pending, so everything queued before the
    /// call has been attempted by the time it returns.
    pub async fn flush(&self) -> AutoSaveResult<FlushOutcome> {
        loop {
            // Registered before the in-flight check so the wakeup is not lost.
            let mut settled = pin!(self.inner.settled.notified());
            settled.as_mut().enable();
            {
                let mut state = self.inner.lock();
                if state.disposed {
                    return Ok(FlushOutcome::Disposed);
                }
                Inner::cancel_timer(&mut state);
            }
            if let Some(outcome) = self.inner.attempt_flush().await {
                return outcome;
            }
            debug!("Waiting for the in-flight flush to settle");
            settled.await;
        }
    }

    /// Cancels timers and discards pending operations without flushing.
    ///
    /// A flush already in flight runs to completion.
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        state.disposed = true;
        Inner::cancel_timer(&mut state);
        let discarded = state.pending.len();
        state.pending.clear();
        self.listener.abort();
        debug!("Disposed write queue, discarded {} operation(s)", discarded);
    }

    /// Number of operations waiting for a flush.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Whether a flush is currently in flight.
    pub fn is_processing(&self) -> bool {
        self.inner.lock().processing
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_timer(state: &mut State) {
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Replaces any pending timer with one firing after `delay`.
    ///
    /// A timer clears itself from the state before flushing, so a later
    /// cancel never aborts a flush in progress.
    fn schedule(self: &Arc<Self>, state: &mut State, delay: Duration) {
        if state.disposed {
            return;
        }
        Self::cancel_timer(state);
        let generation = state.generation;
        let inner = Arc::clone(self);

        debug!("Scheduling flush in {:?}", delay);
        state.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = inner.lock();
                if state.generation != generation {
                    return;
                }
                state.timer = None;
            }
            // Failures are logged and rescheduled inside. A flush already in
            // flight picks up this work when it settles.
            let _ = inner.attempt_flush().await;
        }));
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_delay(attempt);
        let max_jitter = u64::try_from(self.config.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_jitter == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..max_jitter))
    }

    /// Runs one flush; `None` when another one is already in flight.
    async fn attempt_flush(self: &Arc<Self>) -> Option<AutoSaveResult<FlushOutcome>> {
        let batch = {
            let mut state = self.lock();
            if state.disposed {
                return Some(Ok(FlushOutcome::Disposed));
            }
            if state.processing {
                return None;
            }
            if state.pending.is_empty() {
                return Some(Ok(FlushOutcome::Idle));
            }
            if !self.connectivity.is_online() {
                debug!(
                    "Offline; holding {} pending operation(s)",
                    state.pending.len()
                );
                return Some(Ok(FlushOutcome::Offline));
            }
            state.processing = true;
            state.pending.take()
        };

        let count = batch.len();
        debug!("Flushing {} operation(s)", count);
        let result = self.target.persist(&batch).await;

        let mut state = self.lock();
        state.processing = false;
        self.settled.notify_waiters();
        if state.disposed {
            return Some(Ok(FlushOutcome::Disposed));
        }

        Some(self.settle(&mut state, batch, count, result))
    }

    fn settle(
        self: &Arc<Self>,
        state: &mut State,
        batch: Vec<QueuedOperation>,
        count: usize,
        result: anyhow::Result<()>,
    ) -> AutoSaveResult<FlushOutcome> {
        match result {
            Ok(()) => {
                state.retry_attempt = 0;
                info!("Flushed {} operation(s)", count);
                if !state.pending.is_empty() {
                    self.schedule(state, self.config.debounce);
                }
                Ok(FlushOutcome::Flushed { operations: count })
            }
            Err(source) => {
                state.retry_attempt += 1;
                let attempt = state.retry_attempt;

                if attempt >= self.config.max_retries {
                    let operations = count + state.pending.len();
                    state.pending.clear();
                    state.retry_attempt = 0;
                    error!(
                        "Flush failed {} times; dropping {} pending operation(s): {:#}",
                        attempt, operations, source
                    );
                    return Err(AutoSaveError::Dropped {
                        operations,
                        attempts: attempt,
                        source,
                    });
                }

                state.pending.restore(batch);
                let delay = self.retry_delay(attempt);
                warn!(
                    "Flush attempt {} failed, retrying in {:?}: {:#}",
                    attempt, delay, source
                );
                self.schedule(state, delay);
                Err(AutoSaveError::RetryScheduled {
                    attempt,
                    delay,
                    source,
                })
            }
        }
    }
}
