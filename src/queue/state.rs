//! Queue bookkeeping: pending queue, payload registry, reply map.
//!
//! All three structures (plus the single-flight `processing` flag) live in
//! one [`QueueState`] behind one mutex, so every bookkeeping step is atomic
//! with respect to every other. The guard is never held across an await.
//!
//! ## Rules
//! - An identifier in the pending queue has exactly one payload entry and
//!   exactly one pending reply; [`QueueState::remove`] and
//!   [`QueueState::pop_runnable`] take all three out together.
//! - [`QueueState::pop_runnable`] silently skips identifiers whose payload
//!   or reply is gone: they were cancelled after entering the queue.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::queue::TaskId;
use crate::tasks::{Payload, TaskResult};

/// Sending half of a task's pending reply; consumed exactly once.
pub(crate) type ReplySender = oneshot::Sender<TaskResult>;

/// Mutable engine state, guarded by the queue's mutex.
pub(crate) struct QueueState {
    /// Single-flight flag: true while a drain task is running.
    pub(crate) processing: bool,
    /// Identifiers awaiting execution, in arrival order.
    pub(crate) queue: VecDeque<TaskId>,
    /// Payloads keyed by identifier.
    pub(crate) tasks: HashMap<TaskId, Payload>,
    /// Pending replies keyed by identifier.
    pub(crate) replies: HashMap<TaskId, ReplySender>,
}

impl QueueState {
    pub(crate) fn new() -> Self {
        Self {
            processing: false,
            queue: VecDeque::new(),
            tasks: HashMap::new(),
            replies: HashMap::new(),
        }
    }

    /// Registers a task: payload, reply, and a slot at the queue tail.
    pub(crate) fn insert(&mut self, task_id: TaskId, payload: Payload, reply: ReplySender) {
        self.replies.insert(task_id, reply);
        self.tasks.insert(task_id, payload);
        self.queue.push_back(task_id);
    }

    /// Removes one identifier from every structure.
    ///
    /// Returns the pending reply if one was still registered; the caller
    /// rejects it. `None` means the task already ran, was already
    /// cancelled, or never existed.
    pub(crate) fn remove(&mut self, task_id: TaskId) -> Option<ReplySender> {
        self.queue.retain(|queued| *queued != task_id);
        self.tasks.remove(&task_id);
        self.replies.remove(&task_id)
    }

    /// Pops the next runnable entry off the queue head.
    ///
    /// Identifiers whose payload or reply has disappeared were cancelled
    /// concurrently and are skipped. `None` means the queue is empty.
    pub(crate) fn pop_runnable(&mut self) -> Option<(TaskId, Payload, ReplySender)> {
        while let Some(task_id) = self.queue.pop_front() {
            let Some(payload) = self.tasks.remove(&task_id) else {
                continue;
            };
            let Some(reply) = self.replies.remove(&task_id) else {
                continue;
            };
            return Some((task_id, payload, reply));
        }
        None
    }

    /// Empties every structure and returns the orphaned replies for rejection.
    pub(crate) fn drain_replies(&mut self) -> Vec<ReplySender> {
        self.queue.clear();
        self.tasks.clear();
        self.replies.drain().map(|(_, reply)| reply).collect()
    }
}

/// Diagnostic snapshot of one queue instance, returned by
/// [`SerialQueue::dump`](crate::SerialQueue::dump).
///
/// Observability only; the snapshot is a copy and holds no locks.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    /// Queue name.
    pub name: String,
    /// True while a drain task is executing payloads.
    pub processing: bool,
    /// Identifiers awaiting execution, in order.
    pub queued: Vec<TaskId>,
    /// Number of registered payloads.
    pub tasks: usize,
    /// Number of pending replies.
    pub replies: usize,
    /// Number of outstanding delay entries (armed or forwarding).
    pub delayed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ids::IdAllocator;
    use crate::tasks::Message;

    fn entry() -> (Payload, ReplySender, oneshot::Receiver<TaskResult>) {
        let (tx, rx) = oneshot::channel();
        (Payload::Message(Message::new("t")), tx, rx)
    }

    #[test]
    fn test_insert_then_pop_in_order() {
        let ids = IdAllocator::new();
        let mut state = QueueState::new();

        let first = ids.obtain();
        let second = ids.obtain();
        let (p1, r1, _rx1) = entry();
        let (p2, r2, _rx2) = entry();
        state.insert(first, p1, r1);
        state.insert(second, p2, r2);

        assert_eq!(state.pop_runnable().map(|(id, _, _)| id), Some(first));
        assert_eq!(state.pop_runnable().map(|(id, _, _)| id), Some(second));
        assert!(state.pop_runnable().is_none());
    }

    #[test]
    fn test_pop_skips_removed_entries() {
        let ids = IdAllocator::new();
        let mut state = QueueState::new();

        let victim = ids.obtain();
        let survivor = ids.obtain();
        let (p1, r1, _rx1) = entry();
        let (p2, r2, _rx2) = entry();
        state.insert(victim, p1, r1);
        state.insert(survivor, p2, r2);

        assert!(state.remove(victim).is_some());
        assert_eq!(state.pop_runnable().map(|(id, _, _)| id), Some(survivor));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let ids = IdAllocator::new();
        let mut state = QueueState::new();

        let task_id = ids.obtain();
        let (p, r, _rx) = entry();
        state.insert(task_id, p, r);

        assert!(state.remove(task_id).is_some());
        assert!(state.remove(task_id).is_none());
    }

    #[test]
    fn test_drain_replies_empties_everything() {
        let ids = IdAllocator::new();
        let mut state = QueueState::new();
        for _ in 0..3 {
            let (p, r, _rx) = entry();
            state.insert(ids.obtain(), p, r);
        }

        let replies = state.drain_replies();
        assert_eq!(replies.len(), 3);
        assert!(state.queue.is_empty());
        assert!(state.tasks.is_empty());
        assert!(state.replies.is_empty());
    }
}
