//! # serialq
//!
//! **serialq** is an ordered, single-flight async task queue for Rust.
//!
//! Callers submit units of work (a typed [`Message`] or an arbitrary async
//! closure) and receive a [`TaskHandle`] that yields the eventual result,
//! supports cancellation, and is uniquely identifiable. Submitted work runs
//! strictly one unit at a time, in submission order, even though each unit
//! may suspend at await points before completing. That prevents the
//! interleaving that would otherwise reorder logically sequential
//! operations on a shared resource.
//!
//! ## Architecture
//! ```text
//!     caller                          caller                     caller
//!       │ send_message / post           │ *_delay                  │ cancel / clear
//!       ▼                               ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  SerialQueue (one instance)                                           │
//! │  - IdAllocator (monotonic task ids)                                   │
//! │  - QueueState  (pending queue + payload registry + reply map)         │
//! │  - DelayPool   (armed timers, proxy replies, weak back-reference)     │
//! └──────────┬──────────────────────────────┬─────────────────────────────┘
//!            ▼                              │
//!     drain task (single flight)            │ timer fires:
//!     loop {                                │   resubmit payload,
//!       pop head id                         │   forward real reply
//!       run payload (handler or closure) ◄──┘   into the proxy
//!       settle reply
//!     }
//! ```
//!
//! ## Guarantees
//! | Property          | Description                                                              |
//! |-------------------|--------------------------------------------------------------------------|
//! | **FIFO**          | Results settle in submission order; delayed tasks join at fire time.     |
//! | **Single flight** | At most one payload executes per queue instance at any instant.          |
//! | **Cancellation**  | Guaranteed for not-yet-started work; no-op for in-flight or unknown ids. |
//! | **No blocking**   | Submission, cancel, and clear return immediately; results arrive through the handle. |
//! | **Non-owning**    | Handles and timers hold weak references; they never keep the queue alive.|
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use serde_json::json;
//! use serialq::{HandlerFn, Message, SerialQueue, TaskError, TaskId, TaskOutput};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Dispatch strategy for message payloads.
//!     let handler = HandlerFn::arc(|message: Message, _id: TaskId| async move {
//!         Ok::<TaskOutput, TaskError>(Some(json!(format!("handled {}", message.kind))))
//!     });
//!     let queue = SerialQueue::with_handler("worker", handler);
//!
//!     // Immediate submissions execute in order, one at a time.
//!     let first = queue.send_message(Message::new("alpha"));
//!     let second = queue.post(|id| async move {
//!         Ok::<TaskOutput, TaskError>(Some(json!(format!("closure {id}"))))
//!     });
//!
//!     // Delayed submissions claim their slot when the timer fires.
//!     let third = queue.send_message_delay(Message::new("beta"), Duration::from_millis(10));
//!
//!     assert_eq!(first.result().await, Ok(Some(json!("handled alpha"))));
//!     assert!(second.result().await.is_ok());
//!     assert_eq!(third.result().await, Ok(Some(json!("handled beta"))));
//! }
//! ```

mod delay;
mod error;
mod queue;
mod tasks;

// ---- Public re-exports ----

pub use error::{QueueError, TaskError};
pub use queue::{QueueSnapshot, SerialQueue, TaskId};
pub use tasks::{
    BoxPayloadFuture, HandleMessage, HandlerFn, Message, NoopHandler, TaskHandle, TaskOutput,
    TaskResult,
};
