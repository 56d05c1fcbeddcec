//! Dispatch Binary
//!
//! Loads a JSON dataset of couriers and orders into the in-memory repository,
//! runs an assignment for every courier and prints one JSON line per courier.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin dispatch -- dataset.json
//! ```
//!
//! The dataset looks like:
//!
//! ```json
//! {
//!   "couriers": [{"courier_id": 1, "courier_type": "foot", "regions": [1], "working_hours": ["11:35-14:05"]}],
//!   "orders": [{"order_id": 1, "weight": 0.23, "region": 1, "delivery_hours": ["09:00-18:00"]}]
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `DISPATCH_CONFIG`: Path to a `dispatch.toml` (default: standard locations)
//! - `DISPATCH_CONFLICT_RETRIES`: Override `engine.conflict_retries`
//! - `DISPATCH_LOG_LEVEL`: Override `logging.level`
//! - `RUST_LOG`: Log level (takes precedence over the configured level)

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use courier_dispatch::db::{self, DispatchConfig};
use courier_dispatch::engine::AssignmentOrchestrator;
use courier_dispatch::models::{AssignmentResponse, CourierId, CourierRecord, OrderRecord};
use courier_dispatch::services;

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    couriers: Vec<CourierRecord>,
    #[serde(default)]
    orders: Vec<OrderRecord>,
}

#[derive(Debug, Serialize)]
struct CourierAssignment {
    courier_id: CourierId,
    #[serde(flatten)]
    response: AssignmentResponse,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DispatchConfig::from_env()?;

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .or_else(|| config.logging.level.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .context("usage: dispatch <dataset.json>")?;
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read dataset {}", path))?;
    let dataset: Dataset = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset {}", path))?;

    db::init_repository()?;
    let repository = Arc::clone(db::get_repository()?);
    info!("Repository initialized successfully");

    let courier_ids = services::import_couriers(repository.as_ref(), dataset.couriers).await?;
    services::import_orders(repository.as_ref(), dataset.orders).await?;

    let orchestrator = AssignmentOrchestrator::new(repository);
    for courier_id in courier_ids {
        let batch =
            services::assign_orders(&orchestrator, courier_id, config.engine.conflict_retries)
                .await?;
        let line = CourierAssignment {
            courier_id,
            response: batch.to_response(),
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}
