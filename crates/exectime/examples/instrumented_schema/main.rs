//! Example: execution-time logging on an in-memory schema.
//!
//! Run with:
//!   cargo run --example instrumented_schema -p exectime
//!
//! Set `RUST_LOG=exectime=trace` to also see registration diagnostics.

use exectime::prelude::*;
use exectime::{Collection, ConsoleSink, Query};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("exectime=debug")),
        )
        .init();

    // Default sink: tracing at debug level, high verbosity.
    let mut users_schema = Schema::new("users");
    log_execution_time(&mut users_schema, None)?;

    let users = Model::new("User", "users");
    let mut query = users
        .find(json!({"active": true}))
        .additional_log_properties(json!({"route": "/users"}));
    let found = users_schema
        .exec_async(&mut query, async {
            tokio::time::sleep(Duration::from_millis(15)).await;
            vec!["alice", "bob"]
        })
        .await?;
    println!("found {} users", found.len());

    let mut agg = users.aggregate(vec![
        json!({"$match": {"active": true}}),
        json!({"$group": {"_id": "$team", "n": {"$sum": 1}}}),
    ]);
    users_schema.exec(&mut agg, |_| ())?;

    // Console sink, summary lines only.
    let mut audit_schema = Schema::new("audit");
    log_execution_time(
        &mut audit_schema,
        Some(
            ExecTimeConfig::new()
                .with_logger(ConsoleSink::new().prefix("[audit]"))
                .with_logger_level("info")
                .with_logger_verbosity(Verbosity::Normal),
        ),
    )?;
    let mut purge = Query::on_collection("deleteMany", Collection::new("audit_log"))
        .filter(json!({"ts": {"$lt": 0}}));
    audit_schema.exec(&mut purge, |_| 0u64)?;

    // Custom formatter: slow-query alerting only.
    let mut orders_schema = Schema::new("orders");
    log_execution_time(
        &mut orders_schema,
        Some(ExecTimeConfig::new().with_logger_function(
            |log: &QueryLog<'_>| -> ExecTimeResult<()> {
                if log.execution_time_ms >= 10 {
                    tracing::warn!(
                        op = log.operation,
                        collection = log.collection_name,
                        ms = log.execution_time_ms,
                        "slow query"
                    );
                }
                Ok(())
            },
        )),
    )?;
    let orders = Model::new("Order", "orders");
    let mut slow = orders.count_documents(json!({"status": "open"}));
    orders_schema
        .exec_async(&mut slow, tokio::time::sleep(Duration::from_millis(12)))
        .await?;

    Ok(())
}
