//! Error types used by the serial queue and its tasks.
//!
//! This module defines two error surfaces:
//!
//! - [`QueueError`] — errors the queue reports through a task's result
//!   (cancellation, clearing, payload failure, invalid identifiers).
//! - [`TaskError`] — the error a payload itself raises during execution.
//!
//! [`QueueError`] provides helper methods (`as_label`, `as_message`) for
//! logging/metrics and the [`QueueError::is_canceled`] predicate.

use thiserror::Error;

/// # Errors surfaced through a task's result.
///
/// The queue never returns errors synchronously from `send_message`, `post`,
/// `cancel`, or `clear`; everything arrives through
/// [`TaskHandle::result`](crate::TaskHandle::result).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Task was removed from the queue before execution by an explicit cancel.
    ///
    /// Also reported when the owning queue was dropped before the reply
    /// could be settled: the work will never run.
    #[error("task canceled before execution")]
    Canceled,

    /// Task was removed from the queue before execution because the queue was cleared.
    #[error("task canceled: queue cleared")]
    Cleared,

    /// The payload itself failed during execution.
    ///
    /// The underlying cause is preserved as a message. A process failure in
    /// one task never affects subsequent queued tasks.
    #[error("process failure: {error}")]
    ProcessFailure {
        /// The underlying error message.
        error: String,
    },

    /// The handle was built with the invalid sentinel identifier.
    ///
    /// Produced when a delayed submission could not reach the owning queue
    /// at schedule time; the result settles immediately and the payload
    /// never reaches execution.
    #[error("task id is invalid")]
    InvalidId,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use serialq::QueueError;
    ///
    /// assert_eq!(QueueError::Canceled.as_label(), "task_canceled");
    /// assert_eq!(QueueError::InvalidId.as_label(), "invalid_task_id");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Canceled => "task_canceled",
            QueueError::Cleared => "queue_cleared",
            QueueError::ProcessFailure { .. } => "process_failure",
            QueueError::InvalidId => "invalid_task_id",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            QueueError::Canceled => "canceled before execution".to_string(),
            QueueError::Cleared => "canceled: queue cleared".to_string(),
            QueueError::ProcessFailure { error } => format!("process failure: {error}"),
            QueueError::InvalidId => "invalid task id".to_string(),
        }
    }

    /// Indicates whether the task was removed before it could run.
    ///
    /// Returns `true` for [`QueueError::Canceled`] and [`QueueError::Cleared`],
    /// `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use serialq::QueueError;
    ///
    /// assert!(QueueError::Cleared.is_canceled());
    /// assert!(!QueueError::ProcessFailure { error: "boom".into() }.is_canceled());
    /// ```
    pub fn is_canceled(&self) -> bool {
        matches!(self, QueueError::Canceled | QueueError::Cleared)
    }
}

/// # Error raised by a task payload during execution.
///
/// Closures and message handlers return `Result<TaskOutput, TaskError>`;
/// the queue wraps any `TaskError` into [`QueueError::ProcessFailure`],
/// preserving the message as the cause.
///
/// # Example
/// ```
/// use serialq::TaskError;
///
/// let err = TaskError::new("connection refused");
/// assert_eq!(err.message(), "connection refused");
/// assert_eq!(err.to_string(), "connection refused");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    /// Creates a new payload error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(QueueError::Canceled.as_label(), "task_canceled");
        assert_eq!(QueueError::Cleared.as_label(), "queue_cleared");
        assert_eq!(
            QueueError::ProcessFailure { error: "x".into() }.as_label(),
            "process_failure"
        );
        assert_eq!(QueueError::InvalidId.as_label(), "invalid_task_id");
    }

    #[test]
    fn test_is_canceled_covers_clear() {
        assert!(QueueError::Canceled.is_canceled());
        assert!(QueueError::Cleared.is_canceled());
        assert!(!QueueError::InvalidId.is_canceled());
    }

    #[test]
    fn test_process_failure_preserves_cause() {
        let err = QueueError::ProcessFailure {
            error: TaskError::new("boom").to_string(),
        };
        assert!(err.as_message().contains("boom"));
    }
}
