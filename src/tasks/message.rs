//! Consumer-facing message type.
//!
//! A [`Message`] is a `kind` tag plus optional arbitrary JSON data. The
//! queue does not interpret either field; it hands the whole message to the
//! consumer's [`HandleMessage`](crate::HandleMessage) implementation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of typed work for the message handler.
///
/// # Example
/// ```
/// use serde_json::json;
/// use serialq::Message;
///
/// let msg = Message::new("greet").with_data(json!({ "name": "Ana" }));
/// assert_eq!(msg.kind, "greet");
/// assert!(msg.data.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type tag, dispatched on by the consumer handler.
    pub kind: String,

    /// Optional message data; absent for pure signals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Message {
    /// Creates a message of the given kind with no data.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
        }
    }

    /// Attaches data to the message.
    #[inline]
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_sets_fields() {
        let msg = Message::new("ping");
        assert_eq!(msg.kind, "ping");
        assert!(msg.data.is_none());

        let msg = msg.with_data(json!(1));
        assert_eq!(msg.data, Some(json!(1)));
    }

    #[test]
    fn test_absent_data_is_skipped_in_serialization() {
        let msg = Message::new("ping");
        assert_eq!(serde_json::to_value(&msg).unwrap(), json!({ "kind": "ping" }));
    }
}
