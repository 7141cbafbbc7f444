//! # DelayPool: deferred submission with proxy replies.
//!
//! Scheduling and execution are split: the caller gets a stable
//! [`TaskHandle`] at schedule time, but the payload claims its ordering
//! slot only when the delay elapses. Delayed tasks therefore interleave
//! correctly with immediate tasks submitted later whose turn comes earlier.
//!
//! ## Protocol
//! ```text
//! schedule(payload, delay)
//!   ├─► allocate id, record Armed { timer token, proxy sender }
//!   ├─► spawn timer: select! { token.cancelled() | sleep(delay) }
//!   │     (the payload rides in the timer task)
//!   └─► return handle wrapping the proxy receiver
//!
//! timer fires
//!   ├─► upgrade Weak<SerialQueue>      (queue gone → no-op)
//!   ├─► claim Armed entry, enqueue payload, record Fired { forwarded id }
//!   │     (entry gone → canceled concurrently → do not enqueue)
//!   ├─► drop the strong queue reference
//!   └─► await forwarded reply ──► settle proxy ──► remove entry
//! ```
//!
//! ## Rules
//! - An entry's proxy settles exactly once: direct rejection while
//!   `Armed`, or forwarding after `Fired`. The transition happens under
//!   the pool lock, so the two paths are mutually exclusive.
//! - Timer tasks hold only a weak queue reference before firing and drop
//!   their temporary strong one before awaiting the forwarded reply; the
//!   pool never extends the queue's lifetime.
//! - Lock order is pool then state; the fire path is the only place the
//!   two nest.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::QueueError;
use crate::queue::{SerialQueue, TaskId};
use crate::tasks::{Payload, TaskHandle, TaskResult};

/// One scheduled delay, keyed by the identifier handed to the caller.
enum DelayEntry {
    /// Timer armed; the payload has not touched the pending queue yet.
    Armed {
        timer: CancellationToken,
        proxy: oneshot::Sender<TaskResult>,
    },
    /// Timer fired; the payload runs under the forwarded identifier.
    Fired { forwarded: TaskId },
}

/// Outcome of [`DelayPool::cancel`], routed by the queue-level cancel.
pub(crate) enum DelayCancel {
    /// Entry was armed: timer stopped, proxy rejected.
    Armed,
    /// Entry had fired: the caller should cancel the forwarded identifier.
    Fired { forwarded: TaskId },
    /// No such entry; the identifier belongs to the queue (or nothing).
    Unknown,
}

/// Schedules timers that feed payloads into the owning queue at fire time.
pub(crate) struct DelayPool {
    /// Non-owning back-reference; a dangling queue turns timers into no-ops.
    queue: Weak<SerialQueue>,
    entries: Mutex<HashMap<TaskId, DelayEntry>>,
}

impl DelayPool {
    pub(crate) fn new(queue: Weak<SerialQueue>) -> Self {
        Self {
            queue,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of outstanding entries (armed or forwarding).
    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    /// Schedules `payload` for submission after `delay`.
    ///
    /// Returns immediately with a handle wrapping the proxy reply. If the
    /// owning queue is unreachable the handle settles at once with
    /// [`QueueError::InvalidId`].
    pub(crate) fn schedule(&self, payload: Payload, delay: Duration) -> TaskHandle {
        let Some(queue) = self.queue.upgrade() else {
            error!("queue is gone; delayed task gets an invalid handle");
            return TaskHandle::invalid();
        };

        let task_id = queue.allocate_id();
        let timer = CancellationToken::new();
        let (proxy_tx, proxy_rx) = oneshot::channel();
        self.entries().insert(
            task_id,
            DelayEntry::Armed {
                timer: timer.clone(),
                proxy: proxy_tx,
            },
        );
        debug!(queue = %queue.name(), task = %task_id, ?delay, "delayed task scheduled");

        let weak = self.queue.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(delay) => Self::fire(weak, task_id, payload).await,
            }
        });

        TaskHandle::new(task_id, self.queue.clone(), proxy_rx)
    }

    /// Timer-fire path: resubmit the payload and forward its reply.
    async fn fire(weak: Weak<SerialQueue>, task_id: TaskId, payload: Payload) {
        let Some(queue) = weak.upgrade() else {
            // Queue reclaimed while the timer was pending; the proxy sender
            // died with it, which the handle reports as a cancellation.
            return;
        };

        let (proxy, handle) = {
            let mut entries = queue.delay_pool().entries();
            let proxy = match entries.remove(&task_id) {
                Some(DelayEntry::Armed { proxy, .. }) => proxy,
                // Canceled between the timer firing and claiming the entry.
                _ => return,
            };
            let handle = queue.enqueue(payload);
            entries.insert(
                task_id,
                DelayEntry::Fired {
                    forwarded: handle.task_id(),
                },
            );
            (proxy, handle)
        };
        debug!(queue = %queue.name(), task = %task_id, forwarded = %handle.task_id(), "delayed task fired");

        // Forwarding must not keep the queue alive.
        drop(queue);

        let outcome = handle.result().await;
        let _ = proxy.send(outcome);
        if let Some(queue) = weak.upgrade() {
            queue.delay_pool().entries().remove(&task_id);
        }
    }

    /// Cancels one entry; see [`DelayCancel`] for what the caller does next.
    pub(crate) fn cancel(&self, task_id: TaskId) -> DelayCancel {
        let entry = self.entries().remove(&task_id);
        match entry {
            Some(DelayEntry::Armed { timer, proxy }) => {
                timer.cancel();
                let _ = proxy.send(Err(QueueError::Canceled));
                DelayCancel::Armed
            }
            Some(DelayEntry::Fired { forwarded }) => DelayCancel::Fired { forwarded },
            None => DelayCancel::Unknown,
        }
    }

    /// Cancels every outstanding timer.
    ///
    /// Armed proxies reject with [`QueueError::Cleared`]. Fired entries are
    /// dropped: the engine-level clear rejects their forwarded replies and
    /// the rejection reaches each proxy through the forwarding path.
    pub(crate) fn clear(&self) {
        let drained: Vec<DelayEntry> = self.entries().drain().map(|(_, entry)| entry).collect();
        for entry in drained {
            if let DelayEntry::Armed { timer, proxy } = entry {
                timer.cancel();
                let _ = proxy.send(Err(QueueError::Cleared));
            }
        }
    }

    /// Locks the entry map, recovering from a poisoned mutex.
    fn entries(&self) -> MutexGuard<'_, HashMap<TaskId, DelayEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
