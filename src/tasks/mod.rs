//! Task-facing types: messages, payloads, handlers, and handles.
//!
//! This module provides everything a consumer touches per task:
//! - [`Message`] - typed unit of work for the message handler
//! - [`HandleMessage`] / [`HandlerFn`] / [`NoopHandler`] - dispatch strategy
//! - [`TaskHandle`] - cancel / result / identifier for one submission
//! - [`TaskOutput`] / [`TaskResult`] - result aliases

mod handle;
mod handler;
mod message;
mod payload;

pub use handle::TaskHandle;
pub use handler::{HandleMessage, HandlerFn, NoopHandler};
pub use message::Message;
pub use payload::{BoxPayloadFuture, TaskOutput, TaskResult};

pub(crate) use payload::Payload;
