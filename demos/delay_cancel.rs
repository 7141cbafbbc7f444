//! # Demo: delay_cancel
//!
//! Demonstrates delayed scheduling and best-effort cancellation.
//!
//! Shows how to:
//! - Schedule closures with [`SerialQueue::post_delay`]
//! - Cancel a delayed task before its timer fires
//! - Watch delayed tasks interleave with immediate ones by fire time
//!
//! ## Run
//! ```bash
//! cargo run --example delay_cancel
//! ```

use std::time::Duration;

use serde_json::json;
use serialq::{SerialQueue, TaskError, TaskOutput};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("serialq=debug")),
        )
        .init();

    println!("=== delay_cancel demo ===\n");

    let queue = SerialQueue::new("demo");

    // 1. Two delayed closures, scheduled slow-first. Fire time decides
    //    execution order, not schedule order.
    let slow = queue.post_delay(
        |id| async move {
            println!("[slow] running as task {id}");
            Ok::<TaskOutput, TaskError>(Some(json!("slow done")))
        },
        Duration::from_millis(300),
    );
    let fast = queue.post_delay(
        |id| async move {
            println!("[fast] running as task {id}");
            Ok(Some(json!("fast done")))
        },
        Duration::from_millis(100),
    );

    // 2. A third delayed task that we cancel before its timer fires.
    let doomed = queue.post_delay(
        |id| async move {
            println!("[doomed] this never prints (task {id})");
            Ok(Some(json!("unreachable")))
        },
        Duration::from_millis(200),
    );

    // 3. An immediate task claims its slot right away.
    let immediate = queue.post(|id| async move {
        println!("[immediate] running as task {id}");
        Ok(Some(json!("immediate done")))
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("[main] canceling task {} at t=50ms", doomed.task_id());
    doomed.cancel();

    // 4. Outcomes: immediate first, then fast, then slow; doomed rejects.
    println!("\n[main] immediate -> {:?}", immediate.result().await);
    println!("[main] fast      -> {:?}", fast.result().await);
    println!("[main] doomed    -> {:?}", doomed.result().await);
    println!("[main] slow      -> {:?}", slow.result().await);

    println!("\n=== demo completed ===");
    Ok(())
}
