//! Task payloads and the result aliases shared across the crate.
//!
//! A payload is exactly one of two shapes: a [`Message`] dispatched to the
//! consumer handler, or a boxed one-shot closure invoked directly with the
//! task identifier. Closures are `FnOnce` because a payload runs at most
//! once; each produces its own future, so no shared state is needed.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::{QueueError, TaskError};
use crate::queue::TaskId;
use crate::tasks::message::Message;

/// What a payload produces: an arbitrary JSON value, or nothing.
pub type TaskOutput = Option<Value>;

/// What a handle's result settles to.
pub type TaskResult = Result<TaskOutput, QueueError>;

/// Boxed future returned by a payload invocation.
pub type BoxPayloadFuture = Pin<Box<dyn Future<Output = Result<TaskOutput, TaskError>> + Send>>;

/// Boxed one-shot closure payload.
pub(crate) type BoxClosure = Box<dyn FnOnce(TaskId) -> BoxPayloadFuture + Send>;

/// One unit of submitted work, owned by the queue from submission until
/// dequeue or cancellation.
pub(crate) enum Payload {
    /// Dispatched to the consumer's message handler.
    Message(Message),
    /// Invoked directly, bypassing the handler.
    Closure(BoxClosure),
}

impl Payload {
    /// Boxes a user closure into a stored payload.
    pub(crate) fn closure<F, Fut>(f: F) -> Self
    where
        F: FnOnce(TaskId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<TaskOutput, TaskError>> + Send + 'static,
    {
        Payload::Closure(Box::new(move |task_id| -> BoxPayloadFuture {
            Box::pin(f(task_id))
        }))
    }

    /// Short payload shape tag for logs.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Payload::Message(_) => "message",
            Payload::Closure(_) => "closure",
        }
    }
}
