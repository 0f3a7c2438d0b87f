//! Message Correlation Example
//!
//! Drives an order process through two parallel message waits and asserts on
//! what the instance is waiting for after each correlation.
//!
//! Run with `RUST_LOG=bpm_assert=debug` to see every engine command and
//! assertion as it runs.

use bpm_assert::{
    ProcessEngineAssertions, Result,
    memory::{InMemoryEngine, ProcessModel, WaitState},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let engine = InMemoryEngine::default();
    engine
        .deploy(
            ProcessModel::new("order")
                .stage([
                    WaitState::message("ReceivePayment", "paymentReceived"),
                    WaitState::message("ReserveStock", "stockReserved"),
                ])
                .then(WaitState::user_task("ShipOrder", "Ship order")),
        )
        .await?;

    let order = engine
        .start_process_instance_with_business_key("order", "ORD-42")
        .await?;
    let assertions = ProcessEngineAssertions::new(&engine);
    let order_assert = assertions.process_instance(&order);

    order_assert
        .is_waiting_for(["paymentReceived", "stockReserved"])
        .await?;

    engine.correlate_message("paymentReceived").await?;
    order_assert
        .is_not_waiting_for("paymentReceived")
        .await?
        .is_waiting_for("stockReserved")
        .await?;

    // Still waiting for stock, so this one fails.
    if let Err(e) = order_assert.is_not_waiting_for("stockReserved").await {
        println!("{e}");
    }

    engine.correlate_message("stockReserved").await?;
    order_assert
        .is_not_waiting_for(["paymentReceived", "stockReserved"])
        .await?
        .is_waiting_at("ShipOrder")
        .await?;

    let ship = order_assert.task().await?;
    engine.complete_task(&ship.actual().id).await?;
    order_assert.is_ended().await?;

    println!("{order} completed");
    Ok(())
}
