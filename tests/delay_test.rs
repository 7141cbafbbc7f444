//! Integration tests for delayed scheduling: proxy forwarding, fire-time
//! ordering, and cancellation before and after the timer fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::oneshot;

use serialq::{
    HandlerFn, Message, QueueError, SerialQueue, TaskError, TaskId, TaskOutput,
};

fn greeter() -> Arc<SerialQueue> {
    let handler = HandlerFn::arc(|message: Message, _id: TaskId| async move {
        let name = message
            .data
            .as_ref()
            .and_then(|data| data.get("name"))
            .and_then(|name| name.as_str())
            .unwrap_or("stranger");
        Ok::<TaskOutput, TaskError>(Some(json!(format!("hello {name}"))))
    });
    SerialQueue::with_handler("greeter", handler)
}

#[tokio::test(start_paused = true)]
async fn test_delayed_submission_returns_handle_immediately() {
    let queue = greeter();
    let message = Message::new("greet").with_data(json!({ "name": "Ana" }));
    let handle = queue.send_message_delay(message, Duration::from_millis(50));

    // Schedule time: stable handle, pending queue untouched.
    assert!(handle.task_id().is_valid());
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.dump().delayed, 1);

    // After the delay the forwarded execution settles the proxy.
    assert_eq!(handle.result().await, Ok(Some(json!("hello Ana"))));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(queue.dump().delayed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_failure_forwards_to_proxy() {
    let queue = SerialQueue::new("delay-fail");
    let handle = queue.post_delay(
        |_id| async move { Err::<TaskOutput, TaskError>(TaskError::new("boom")) },
        Duration::from_millis(10),
    );
    match handle.result().await {
        Err(QueueError::ProcessFailure { error }) => assert!(error.contains("boom")),
        other => panic!("expected process failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_delays_execute_in_fire_order_not_schedule_order() {
    let queue = SerialQueue::new("fire-order");
    let order = Arc::new(Mutex::new(Vec::new()));

    let slow_order = Arc::clone(&order);
    let slow = queue.post_delay(
        move |_id| async move {
            slow_order.lock().unwrap().push("slow");
            Ok::<TaskOutput, TaskError>(None)
        },
        Duration::from_millis(100),
    );
    let fast_order = Arc::clone(&order);
    let fast = queue.post_delay(
        move |_id| async move {
            fast_order.lock().unwrap().push("fast");
            Ok::<TaskOutput, TaskError>(None)
        },
        Duration::from_millis(10),
    );

    assert_eq!(fast.result().await, Ok(None));
    assert_eq!(slow.result().await, Ok(None));
    assert_eq!(*order.lock().unwrap(), vec!["fast", "slow"]);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_tasks_interleave_with_immediates_by_fire_time() {
    let queue = SerialQueue::new("interleave");
    let order = Arc::new(Mutex::new(Vec::new()));

    let record = |tag: &'static str| {
        let order = Arc::clone(&order);
        move |_id: TaskId| async move {
            order.lock().unwrap().push(tag);
            Ok::<TaskOutput, TaskError>(None)
        }
    };

    let first = queue.post(record("first"));
    let delayed = queue.post_delay(record("delayed"), Duration::from_millis(5));
    let second = queue.post(record("second"));

    assert_eq!(first.result().await, Ok(None));
    assert_eq!(second.result().await, Ok(None));
    assert_eq!(delayed.result().await, Ok(None));

    // Both immediates held queue slots before the timer fired.
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "delayed"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_fire_rejects_and_skips_handler() {
    let invoked = Arc::new(AtomicBool::new(false));
    let invoked_flag = Arc::clone(&invoked);
    let handler = HandlerFn::arc(move |_message: Message, _id: TaskId| {
        let invoked = Arc::clone(&invoked_flag);
        async move {
            invoked.store(true, Ordering::SeqCst);
            Ok::<TaskOutput, TaskError>(None)
        }
    });
    let queue = SerialQueue::with_handler("cancel-delay", handler);

    let handle = queue.send_message_delay(Message::new("greet"), Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();

    assert_eq!(handle.result().await, Err(QueueError::Canceled));

    // Well past the original fire time: the timer must stay dead.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!invoked.load(Ordering::SeqCst));
    assert_eq!(queue.dump().delayed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_fire_removes_forwarded_task() {
    let queue = SerialQueue::new("post-fire-cancel");
    let (gate_tx, gate_rx) = oneshot::channel::<()>();
    let blocker = queue.post(move |_id| async move {
        let _ = gate_rx.await;
        Ok::<TaskOutput, TaskError>(None)
    });
    tokio::time::sleep(Duration::from_millis(1)).await;

    let ran = Arc::new(AtomicBool::new(false));
    let ran_flag = Arc::clone(&ran);
    let delayed = queue.post_delay(
        move |_id| async move {
            ran_flag.store(true, Ordering::SeqCst);
            Ok::<TaskOutput, TaskError>(None)
        },
        Duration::from_millis(10),
    );

    // Timer fires while the blocker is still executing: the forwarded task
    // waits in the queue under a fresh identifier.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(queue.len(), 1);

    // Canceling the original delayed id resolves to the forwarded id.
    delayed.cancel();
    assert_eq!(queue.len(), 0);

    gate_tx.send(()).unwrap();
    assert_eq!(delayed.result().await, Err(QueueError::Canceled));
    assert_eq!(blocker.result().await, Ok(None));
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_clear_cancels_armed_timers() {
    let invoked = Arc::new(AtomicBool::new(false));
    let first_flag = Arc::clone(&invoked);
    let second_flag = Arc::clone(&invoked);

    let queue = SerialQueue::new("clear-delays");
    let first = queue.post_delay(
        move |_id| async move {
            first_flag.store(true, Ordering::SeqCst);
            Ok::<TaskOutput, TaskError>(None)
        },
        Duration::from_millis(50),
    );
    let second = queue.post_delay(
        move |_id| async move {
            second_flag.store(true, Ordering::SeqCst);
            Ok::<TaskOutput, TaskError>(None)
        },
        Duration::from_millis(60),
    );
    assert_eq!(queue.dump().delayed, 2);

    queue.clear();
    assert_eq!(first.result().await, Err(QueueError::Cleared));
    assert_eq!(second.result().await, Err(QueueError::Cleared));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!invoked.load(Ordering::SeqCst));
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.dump().delayed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timer_after_queue_drop_is_a_noop() {
    let queue = SerialQueue::new("abandoned");
    let handle = queue.post_delay(
        |_id| async move { Ok::<TaskOutput, TaskError>(None) },
        Duration::from_millis(50),
    );
    drop(queue);

    // The timer upgrade fails and the proxy sender died with the pool.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.result().await, Err(QueueError::Canceled));
}
