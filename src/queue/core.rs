//! # SerialQueue: ordered, single-flight task executor.
//!
//! The queue accepts units of work (a [`Message`] for the consumer handler,
//! or an async closure) and executes them strictly one at a time, in
//! submission order, even when individual payloads suspend internally. This
//! prevents the interleaving that would otherwise reorder logically
//! sequential operations in a cooperative-concurrency environment.
//!
//! ## Architecture
//! ```text
//! callers
//!   │ send_message / post ──────────────► enqueue ──► kick
//!   │ send_message_delay / post_delay ─► DelayPool     │
//!   │                                      (timer)     ▼
//!   │                                        │     drain task (single flight)
//!   │                                        │       loop {
//!   │                                 fire: enqueue     pop head id
//!   │                                        │          run payload   ◄─ only suspension point
//!   │                                        │          settle reply
//!   ▼                                        ▼        }
//! TaskHandle ◄────────── reply / proxy ── settlement
//! ```
//!
//! ## Rules
//! - **Single flight**: at most one payload executes per queue instance at
//!   any time; the drain task is guarded by the `processing` flag.
//! - **FIFO**: identifiers dequeue in pending-queue order; delayed tasks
//!   join the queue at timer-fire time, not at schedule time.
//! - **Never blocks**: submission, cancellation, and clearing are plain
//!   synchronous calls; results arrive only through [`TaskHandle::result`].
//! - **Cancellation is best-effort**: guaranteed for work that has not been
//!   dequeued, a no-op for in-flight or unknown identifiers.
//!
//! ## Example
//! ```
//! use serde_json::json;
//! use serialq::{HandlerFn, Message, SerialQueue, TaskError, TaskId, TaskOutput};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let handler = HandlerFn::arc(|message: Message, _id: TaskId| async move {
//!         let name = message
//!             .data
//!             .as_ref()
//!             .and_then(|data| data.get("name"))
//!             .and_then(|name| name.as_str())
//!             .ok_or_else(|| TaskError::new("missing name"))?;
//!         Ok::<TaskOutput, TaskError>(Some(json!(format!("hello {name}"))))
//!     });
//!
//!     let queue = SerialQueue::with_handler("greeter", handler);
//!     let handle = queue.send_message(Message::new("greet").with_data(json!({ "name": "Ana" })));
//!     assert_eq!(handle.result().await, Ok(Some(json!("hello Ana"))));
//! }
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::delay::{DelayCancel, DelayPool};
use crate::error::{QueueError, TaskError};
use crate::queue::ids::{IdAllocator, TaskId};
use crate::queue::state::{QueueSnapshot, QueueState};
use crate::tasks::{HandleMessage, Message, NoopHandler, Payload, TaskHandle, TaskOutput};

/// Ordered, single-flight task executor.
///
/// Construct with [`SerialQueue::new`] (closure-only use) or
/// [`SerialQueue::with_handler`] (message dispatch). Both return an
/// `Arc<SerialQueue>`: handles and the delay pool keep only [`Weak`]
/// back-references, so dropping the last external `Arc` reclaims the queue
/// even while timers are outstanding.
///
/// All submission methods must be called within a tokio runtime; the drain
/// loop and delay timers run as spawned tasks.
///
/// [`Weak`]: std::sync::Weak
pub struct SerialQueue {
    name: Arc<str>,
    ids: IdAllocator,
    handler: Arc<dyn HandleMessage>,
    state: Mutex<QueueState>,
    delay: DelayPool,
}

impl SerialQueue {
    /// Creates a queue with the no-op message handler.
    pub fn new(name: impl Into<Arc<str>>) -> Arc<Self> {
        Self::with_handler(name, Arc::new(NoopHandler))
    }

    /// Creates a queue that dispatches message payloads to `handler`.
    pub fn with_handler(name: impl Into<Arc<str>>, handler: Arc<dyn HandleMessage>) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|queue| Self {
            name,
            ids: IdAllocator::new(),
            handler,
            state: Mutex::new(QueueState::new()),
            delay: DelayPool::new(queue.clone()),
        })
    }

    /// Returns the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submits a message for handler dispatch; never blocks.
    pub fn send_message(self: &Arc<Self>, message: Message) -> TaskHandle {
        self.enqueue(Payload::Message(message))
    }

    /// Schedules a message for handler dispatch after `delay`.
    ///
    /// The handle is returned immediately; the message claims its ordering
    /// slot only when the timer fires, so its position relative to other
    /// tasks is determined by fire time, not schedule time.
    pub fn send_message_delay(&self, message: Message, delay: Duration) -> TaskHandle {
        self.delay.schedule(Payload::Message(message), delay)
    }

    /// Submits a closure invoked with the task identifier; never blocks.
    ///
    /// The closure bypasses the message handler.
    pub fn post<F, Fut>(self: &Arc<Self>, closure: F) -> TaskHandle
    where
        F: FnOnce(TaskId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<TaskOutput, TaskError>> + Send + 'static,
    {
        self.enqueue(Payload::closure(closure))
    }

    /// Schedules a closure for execution after `delay`.
    pub fn post_delay<F, Fut>(&self, closure: F, delay: Duration) -> TaskHandle
    where
        F: FnOnce(TaskId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<TaskOutput, TaskError>> + Send + 'static,
    {
        self.delay.schedule(Payload::closure(closure), delay)
    }

    /// Cancels a task that has not started executing.
    ///
    /// Covers every lifecycle stage the identifier can be in:
    /// - armed delay timer: the timer is stopped and the handle's proxy
    ///   reply rejected with [`QueueError::Canceled`];
    /// - fired delay timer: the forwarded task is removed from the queue
    ///   (rejection reaches the proxy through the forwarding path);
    /// - queued immediate task: removed and rejected.
    ///
    /// Unknown, already-executed, and already-cancelled identifiers are a
    /// silent no-op. An in-flight execution is never affected.
    pub fn cancel(&self, task_id: TaskId) {
        match self.delay.cancel(task_id) {
            DelayCancel::Armed => {
                debug!(queue = %self.name, task = %task_id, "canceled delayed task before fire");
            }
            DelayCancel::Fired { forwarded } => self.cancel_queued(forwarded),
            DelayCancel::Unknown => {}
        }
        self.cancel_queued(task_id);
    }

    /// Rejects every queued task and cancels every outstanding timer.
    ///
    /// Pending replies (queued and armed-delayed alike) reject with
    /// [`QueueError::Cleared`]. An in-flight execution is not aborted; its
    /// reply was consumed at dequeue time and settles normally. Tasks
    /// submitted after `clear` behave normally.
    pub fn clear(&self) {
        let replies = self.state().drain_replies();
        if !replies.is_empty() {
            debug!(queue = %self.name, dropped = replies.len(), "queue cleared");
        }
        for reply in replies {
            let _ = reply.send(Err(QueueError::Cleared));
        }
        self.delay.clear();
    }

    /// Number of tasks queued and not yet executing.
    ///
    /// Delayed tasks do not count until their timer fires.
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    /// Returns true if no task is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captures a diagnostic snapshot and logs it at info level.
    pub fn dump(&self) -> QueueSnapshot {
        let (processing, queued, tasks, replies) = {
            let state = self.state();
            (
                state.processing,
                state.queue.iter().copied().collect::<Vec<_>>(),
                state.tasks.len(),
                state.replies.len(),
            )
        };
        let snapshot = QueueSnapshot {
            name: self.name.to_string(),
            processing,
            queued,
            tasks,
            replies,
            delayed: self.delay.len(),
        };
        info!(
            queue = %snapshot.name,
            processing = snapshot.processing,
            queued = ?snapshot.queued,
            tasks = snapshot.tasks,
            replies = snapshot.replies,
            delayed = snapshot.delayed,
            "queue state"
        );
        snapshot
    }

    // ---------------------------
    // Internals
    // ---------------------------

    /// Locks the state, recovering from a poisoned mutex.
    ///
    /// Bookkeeping never panics while holding the guard, but a payload
    /// panic elsewhere must not wedge the queue.
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates the next task identifier.
    pub(crate) fn allocate_id(&self) -> TaskId {
        self.ids.obtain()
    }

    /// The companion delay pool.
    pub(crate) fn delay_pool(&self) -> &DelayPool {
        &self.delay
    }

    /// Registers a payload at the queue tail and kicks the drain task.
    pub(crate) fn enqueue(self: &Arc<Self>, payload: Payload) -> TaskHandle {
        let task_id = self.allocate_id();
        let kind = payload.kind();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.state().insert(task_id, payload, reply_tx);
        debug!(queue = %self.name, task = %task_id, kind, "task enqueued");
        self.kick();
        TaskHandle::new(task_id, Arc::downgrade(self), reply_rx)
    }

    /// Removes one identifier from the queue and rejects its reply.
    fn cancel_queued(&self, task_id: TaskId) {
        let reply = self.state().remove(task_id);
        if let Some(reply) = reply {
            debug!(queue = %self.name, task = %task_id, "canceled queued task");
            let _ = reply.send(Err(QueueError::Canceled));
        }
    }

    /// Spawns the drain task unless one is already running.
    ///
    /// The flag check and set are atomic under the state lock: a submit
    /// racing a finishing drain either observes `processing` still up (the
    /// drain re-checks the queue before clearing it) or kicks a fresh one.
    fn kick(self: &Arc<Self>) {
        {
            let mut state = self.state();
            if state.processing || state.queue.is_empty() {
                return;
            }
            state.processing = true;
        }
        let queue = Arc::clone(self);
        tokio::spawn(queue.drain());
    }

    /// Executes queued payloads until the queue is empty.
    ///
    /// Holds a strong reference for its lifetime so accepted work completes
    /// even if every external holder drops mid-drain. The payload await is
    /// the only suspension point; all bookkeeping happens under the state
    /// lock. A payload failure settles that task's reply and the loop
    /// continues with the next identifier.
    async fn drain(self: Arc<Self>) {
        loop {
            let next = {
                let mut state = self.state();
                let entry = state.pop_runnable();
                if entry.is_none() {
                    state.processing = false;
                }
                entry
            };
            let Some((task_id, payload, reply)) = next else {
                return;
            };

            debug!(queue = %self.name, task = %task_id, "task executing");
            let outcome = match payload {
                Payload::Closure(closure) => closure(task_id).await,
                Payload::Message(message) => self.handler.on_message(message, task_id).await,
            };
            let settled = outcome.map_err(|cause| {
                error!(queue = %self.name, task = %task_id, %cause, "process failure");
                QueueError::ProcessFailure {
                    error: cause.to_string(),
                }
            });
            // The receiver may be gone (handle dropped); settlement is fire-and-forget.
            let _ = reply.send(settled);
        }
    }
}
