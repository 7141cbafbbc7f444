//! # Demo: messages
//!
//! Demonstrates message dispatch through a serial queue.
//!
//! Shows how to:
//! - Inject a message handler with [`HandlerFn`]
//! - Submit messages and await their results in order
//! - Observe the queue with [`SerialQueue::dump`]
//!
//! ## Run
//! ```bash
//! cargo run --example messages
//! ```

use serde_json::json;
use serialq::{HandlerFn, Message, SerialQueue, TaskError, TaskId, TaskOutput};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("serialq=debug")),
        )
        .init();

    println!("=== messages demo ===\n");

    // 1. Define the dispatch strategy.
    let handler = HandlerFn::arc(|message: Message, task_id: TaskId| async move {
        println!("[handler] task={task_id} kind={}", message.kind);
        match message.kind.as_str() {
            "greet" => {
                let name = message
                    .data
                    .as_ref()
                    .and_then(|data| data.get("name"))
                    .and_then(|name| name.as_str())
                    .unwrap_or("stranger");
                Ok::<TaskOutput, TaskError>(Some(json!(format!("hello {name}"))))
            }
            "sum" => {
                let total: i64 = message
                    .data
                    .as_ref()
                    .and_then(|data| data.as_array())
                    .map(|items| items.iter().filter_map(|item| item.as_i64()).sum())
                    .unwrap_or(0);
                Ok(Some(json!(total)))
            }
            other => Err(TaskError::new(format!("unknown kind: {other}"))),
        }
    });

    // 2. Create the queue.
    let queue = SerialQueue::with_handler("demo", handler);

    // 3. Submit a few messages; they execute strictly in order.
    let greet = queue.send_message(Message::new("greet").with_data(json!({ "name": "Ana" })));
    let sum = queue.send_message(Message::new("sum").with_data(json!([1, 2, 3, 4])));
    let bad = queue.send_message(Message::new("reboot"));

    println!("[main] queued={} snapshot={:?}\n", queue.len(), queue.dump());

    // 4. Results arrive through the handles.
    println!("[main] greet -> {:?}", greet.result().await);
    println!("[main] sum   -> {:?}", sum.result().await);
    println!("[main] bad   -> {:?}", bad.result().await);

    println!("\n=== demo completed ===");
    Ok(())
}
