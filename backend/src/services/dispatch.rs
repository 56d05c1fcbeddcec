//! High-level dispatch operations.
//!
//! These functions are what a caller (the dispatch binary, a future HTTP
//! layer) uses. They work with any [`FullRepository`] implementation and wrap
//! the assignment engine with the caller-side policies: bulk imports, a
//! bounded retry after a lost claim race, and reconciliation after profile
//! updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::courier_stats::{earnings, rating, CourierProfile};
use crate::db::repository::{
    CourierRepository, FullRepository, OrderRepository, RepositoryResult,
};
use crate::engine::{AssignmentOrchestrator, DispatchError, DispatchResult, ReconcileReport};
use crate::models::{
    AssignmentBatch, Courier, CourierId, CourierPatch, CourierRecord, Order, OrderId, OrderRecord,
};

// ==================== Health ====================

/// Check if the store is healthy.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Imports ====================

/// Store a batch of couriers from their wire records.
///
/// # Returns
/// * `Ok(ids)` - Ids of the stored couriers, in input order
/// * `Err(RepositoryError::ValidationError)` - An id repeats or already
///   exists; nothing from this import is stored
pub async fn import_couriers<R: FullRepository + ?Sized>(
    repo: &R,
    records: Vec<CourierRecord>,
) -> RepositoryResult<Vec<CourierId>> {
    let couriers: Vec<Courier> = records.into_iter().map(Courier::from).collect();
    let ids = repo.store_couriers(&couriers).await?;
    info!("Imported {} couriers", ids.len());
    Ok(ids)
}

/// Store a batch of orders from their wire records (weights in kilograms).
pub async fn import_orders<R: FullRepository + ?Sized>(
    repo: &R,
    records: Vec<OrderRecord>,
) -> RepositoryResult<Vec<OrderId>> {
    let orders: Vec<Order> = records.into_iter().map(Order::from).collect();
    let ids = repo.store_orders(&orders).await?;
    info!("Imported {} orders", ids.len());
    Ok(ids)
}

// ==================== Courier profiles ====================

/// Courier profile together with earnings and rating.
pub async fn get_courier_profile<R: FullRepository + ?Sized>(
    repo: &R,
    courier_id: CourierId,
) -> DispatchResult<CourierProfile> {
    let courier = repo.get_courier(courier_id).await?;
    let history = repo.orders_for_courier(courier_id).await?;
    Ok(CourierProfile {
        courier: CourierRecord::from(&courier),
        earnings: earnings(courier.courier_type, &history),
        rating: rating(&history),
    })
}

/// Result of a profile update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierUpdate {
    pub courier: CourierRecord,
    /// Open orders the updated profile no longer allows, now unassigned.
    pub released: Vec<OrderId>,
}

/// Apply a partial profile update, then reconcile the courier's open orders.
///
/// # Returns
/// * `Err(DispatchError::InvalidConstraint)` - The patch sets no field
/// * `Err(DispatchError::NotFound)` - Unknown courier
pub async fn update_courier(
    orchestrator: &AssignmentOrchestrator,
    courier_id: CourierId,
    patch: &CourierPatch,
) -> DispatchResult<CourierUpdate> {
    if patch.is_empty() {
        return Err(DispatchError::invalid("courier update sets no field"));
    }
    let courier = orchestrator
        .repository()
        .update_courier(courier_id, patch)
        .await?;
    let ReconcileReport { released, .. } = orchestrator.reconcile(courier_id).await?;
    Ok(CourierUpdate {
        courier: CourierRecord::from(&courier),
        released,
    })
}

// ==================== Assignment lifecycle ====================

/// Run `Assign` for a courier, re-running it after a lost claim race.
///
/// Each retry starts from a fresh read of the order pool. Only
/// [`DispatchError::Conflict`] is retried, at most `conflict_retries` times;
/// every other error is returned as-is.
pub async fn assign_orders(
    orchestrator: &AssignmentOrchestrator,
    courier_id: CourierId,
    conflict_retries: u32,
) -> DispatchResult<AssignmentBatch> {
    let mut attempt = 0;
    loop {
        match orchestrator.assign(courier_id).await {
            Err(err @ DispatchError::Conflict { .. }) if attempt < conflict_retries => {
                attempt += 1;
                warn!(
                    "Assign for courier {} lost a claim race, retrying ({}/{}): {}",
                    courier_id, attempt, conflict_retries, err
                );
            }
            result => return result,
        }
    }
}

/// Record delivery of an order by the courier holding it.
pub async fn complete_order(
    orchestrator: &AssignmentOrchestrator,
    courier_id: CourierId,
    order_id: OrderId,
    completed_at: DateTime<Utc>,
) -> DispatchResult<Order> {
    orchestrator
        .complete(courier_id, order_id, completed_at)
        .await
}
