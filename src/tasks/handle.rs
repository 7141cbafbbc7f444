//! Caller-side task handle.
//!
//! Every submission returns a [`TaskHandle`]: the task's identifier, a way
//! to cancel it, and the future result. One type covers both the immediate
//! and the delayed variant; a delayed handle simply wraps the proxy reply
//! that the delay pool settles once the timer fires and the forwarded task
//! completes.
//!
//! Handles hold only a [`Weak`] reference to their queue, so an outstanding
//! handle never keeps the queue alive.

use std::fmt;
use std::sync::Weak;

use tokio::sync::oneshot;

use crate::error::QueueError;
use crate::queue::{SerialQueue, TaskId};
use crate::tasks::payload::TaskResult;

/// Handle to one submitted task.
///
/// # Example
/// ```
/// use serde_json::json;
/// use serialq::{SerialQueue, TaskError, TaskOutput};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let queue = SerialQueue::new("demo");
///     let handle = queue.post(|_id| async move {
///         Ok::<TaskOutput, TaskError>(Some(json!(2 + 2)))
///     });
///
///     assert!(handle.task_id().is_valid());
///     assert_eq!(handle.result().await, Ok(Some(json!(4))));
/// }
/// ```
#[derive(Debug)]
pub struct TaskHandle {
    task_id: TaskId,
    queue: Weak<SerialQueue>,
    reply: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    pub(crate) fn new(
        task_id: TaskId,
        queue: Weak<SerialQueue>,
        reply: oneshot::Receiver<TaskResult>,
    ) -> Self {
        Self {
            task_id,
            queue,
            reply,
        }
    }

    /// Builds a handle that settles immediately with [`QueueError::InvalidId`].
    ///
    /// Returned by delayed submissions that could not reach the owning queue.
    pub(crate) fn invalid() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(QueueError::InvalidId));
        Self {
            task_id: TaskId::INVALID,
            queue: Weak::new(),
            reply: rx,
        }
    }

    /// Returns the task identifier, unique within the owning queue.
    #[inline]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Cancels the task if it has not started executing.
    ///
    /// Best-effort: a task that is already in flight keeps running and
    /// settles with its own outcome. A no-op if the queue is gone or the
    /// task already settled.
    pub fn cancel(&self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.cancel(self.task_id);
        }
    }

    /// Awaits the task's result, consuming the handle.
    ///
    /// Settles exactly once: the payload's outcome, a cancellation error,
    /// or a process failure. A queue dropped before settling the reply
    /// surfaces as [`QueueError::Canceled`], since the work will never run.
    pub async fn result(self) -> TaskResult {
        match self.reply.await {
            Ok(outcome) => outcome,
            Err(_) => Err(QueueError::Canceled),
        }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.task_id)
    }
}
