//! Message dispatch strategy.
//!
//! The queue does not know what messages mean. Consumers inject a
//! [`HandleMessage`] implementation at construction time; every message
//! payload is dispatched to it, in queue order, one at a time. Closure
//! payloads bypass the handler entirely.
//!
//! [`HandlerFn`] adapts a plain async closure into a handler, so most
//! consumers never need to write an impl block.
//!
//! # Example
//! ```
//! use serde_json::json;
//! use serialq::{HandlerFn, Message, TaskError, TaskId, TaskOutput};
//!
//! let handler = HandlerFn::arc(|message: Message, _id: TaskId| async move {
//!     match message.kind.as_str() {
//!         "ping" => Ok::<TaskOutput, TaskError>(Some(json!("pong"))),
//!         other => Err(TaskError::new(format!("unknown kind: {other}"))),
//!     }
//! });
//! # let _ = handler;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::queue::TaskId;
use crate::tasks::message::Message;
use crate::tasks::payload::TaskOutput;

/// # Consumer-supplied message handler.
///
/// The queue awaits `on_message` for every message payload, strictly one at
/// a time. The handler may suspend freely; the queue does not dequeue the
/// next task until the returned future completes.
///
/// The default implementation ignores the message and returns `Ok(None)`.
#[async_trait]
pub trait HandleMessage: Send + Sync + 'static {
    /// Handles one message; the returned value settles the task's result.
    ///
    /// An `Err` is wrapped into
    /// [`QueueError::ProcessFailure`](crate::QueueError::ProcessFailure)
    /// and never stops the queue from draining subsequent tasks.
    async fn on_message(&self, message: Message, task_id: TaskId) -> Result<TaskOutput, TaskError> {
        let _ = (message, task_id);
        Ok(None)
    }
}

/// Handler that ignores every message and resolves to `None`.
///
/// Used by [`SerialQueue::new`](crate::SerialQueue::new); useful on its own
/// for closure-only queues.
pub struct NoopHandler;

#[async_trait]
impl HandleMessage for NoopHandler {}

/// Function-backed message handler.
///
/// Wraps a closure that produces a fresh future per dispatched message.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need an
    /// `Arc<dyn HandleMessage>` for queue construction.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared trait object handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> HandleMessage for HandlerFn<F>
where
    F: Fn(Message, TaskId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TaskOutput, TaskError>> + Send + 'static,
{
    async fn on_message(&self, message: Message, task_id: TaskId) -> Result<TaskOutput, TaskError> {
        (self.f)(message, task_id).await
    }
}
