//! Per-courier assignment lifecycle.
//!
//! Every operation runs inside one [`CourierTransaction`], so it holds the
//! courier's lock from the first read to the commit. Any error before the
//! commit drops the transaction and with it every staged write.
//!
//! ```text
//!  NoOpenBatch ──filter + knapsack──▶ BatchComputed ──commit──▶ BatchPersisted
//!       ▲                                                            │
//!       └──────────── all orders completed or released ──────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::availability::{candidate_orders, eligible_orders};
use super::clock::{Clock, SystemClock};
use super::error::{DispatchError, DispatchResult};
use super::knapsack::KnapsackResolver;
use crate::db::repository::{AssignmentRepository, CourierTransaction, FullRepository};
use crate::models::{AssignmentBatch, CourierId, Order, OrderId};

/// Outcome of re-screening a courier's open orders after a profile change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub courier_id: CourierId,
    /// Orders returned to the unassigned pool, by id.
    pub released: Vec<OrderId>,
    /// Orders the courier keeps, by id.
    pub retained: Vec<OrderId>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.released.is_empty()
    }
}

/// Ties the availability filter and the knapsack to the order store.
///
/// The orchestrator performs no internal retries; a lost claim race surfaces
/// as [`DispatchError::Conflict`] and the caller decides whether to run the
/// call again.
#[derive(Clone)]
pub struct AssignmentOrchestrator {
    repo: Arc<dyn FullRepository>,
    clock: Arc<dyn Clock>,
}

impl AssignmentOrchestrator {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        Self::with_clock(repo, Arc::new(SystemClock))
    }

    pub fn with_clock(repo: Arc<dyn FullRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    /// Return the courier's open batch, or build, persist and return a new one.
    ///
    /// # Returns
    /// * `Ok(batch)` - The open batch (unchanged, original timestamp), a new
    ///   batch, or an empty batch without timestamp when nothing qualifies
    /// * `Err(DispatchError::NotFound)` - Unknown courier
    /// * `Err(DispatchError::Conflict)` - Another courier claimed a selected
    ///   order first; nothing was written
    pub async fn assign(&self, courier_id: CourierId) -> DispatchResult<AssignmentBatch> {
        let mut tx = self.repo.begin(courier_id).await?;

        let open = tx.open_orders().await?;
        if !open.is_empty() {
            let batch = AssignmentBatch::from_open_orders(courier_id, &open);
            debug!(
                "Courier {} already holds {} open orders, returning existing batch",
                courier_id,
                batch.len()
            );
            return Ok(batch);
        }

        let courier = tx.courier().await?;
        let pool = tx.unassigned_orders().await?;
        let candidates = candidate_orders(&courier, &pool);
        if candidates.is_empty() {
            debug!("No candidate orders for courier {}", courier_id);
            return Ok(AssignmentBatch::empty(courier_id));
        }

        let selected =
            KnapsackResolver::from_orders(&candidates, courier.carrying_capacity).select();
        debug!(
            courier_id = %courier_id,
            pool = pool.len(),
            candidates = candidates.len(),
            selected = selected.len(),
            "knapsack selection done"
        );
        if selected.is_empty() {
            return Ok(AssignmentBatch::empty(courier_id));
        }

        let assigned_at = self.clock.now();
        tx.claim_orders(&selected, assigned_at).await?;
        commit(tx, courier_id).await?;

        info!(
            "Assigned {} orders to courier {} at {}",
            selected.len(),
            courier_id,
            assigned_at
        );
        Ok(AssignmentBatch::new(courier_id, selected, assigned_at))
    }

    /// Release every open order the courier's current profile no longer allows.
    ///
    /// Orders that still qualify are kept even when their combined weight now
    /// exceeds the courier's capacity, and no new orders are added.
    pub async fn reconcile(&self, courier_id: CourierId) -> DispatchResult<ReconcileReport> {
        let mut tx = self.repo.begin(courier_id).await?;
        let courier = tx.courier().await?;
        let open = tx.open_orders().await?;

        let retained: Vec<OrderId> = eligible_orders(&courier, &open)
            .into_iter()
            .map(|o| o.id)
            .collect();
        let released: Vec<OrderId> = open
            .iter()
            .map(|o| o.id)
            .filter(|id| !retained.contains(id))
            .collect();

        let report = ReconcileReport {
            courier_id,
            released,
            retained,
        };
        if report.is_noop() {
            return Ok(report);
        }

        tx.release_orders(&report.released).await?;
        commit(tx, courier_id).await?;

        info!(
            "Released {} orders from courier {}: {:?}",
            report.released.len(),
            courier_id,
            report.released
        );
        Ok(report)
    }

    /// Record that the courier delivered `order_id` at `completed_at`.
    ///
    /// Completing an already completed order returns it unchanged.
    ///
    /// # Returns
    /// * `Err(DispatchError::NotFound)` - Unknown courier or order
    /// * `Err(DispatchError::InvalidConstraint)` - The order is not assigned to
    ///   this courier, or `completed_at` is not after the assignment time
    pub async fn complete(
        &self,
        courier_id: CourierId,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> DispatchResult<Order> {
        let mut tx = self.repo.begin(courier_id).await?;
        tx.courier().await?;
        let mut order = tx.order(order_id).await?;

        if order.assigned_courier != Some(courier_id) {
            return Err(DispatchError::invalid(format!(
                "order {} is not assigned to courier {}",
                order_id, courier_id
            )));
        }
        if order.completed_at.is_some() {
            return Ok(order);
        }
        match order.assigned_at {
            Some(assigned_at) if completed_at > assigned_at => {}
            _ => {
                return Err(DispatchError::invalid(format!(
                    "completion time {} of order {} is not after its assignment",
                    completed_at, order_id
                )))
            }
        }

        tx.complete_order(order_id, completed_at).await?;
        commit(tx, courier_id).await?;

        debug!("Courier {} completed order {}", courier_id, order_id);
        order.completed_at = Some(completed_at);
        Ok(order)
    }
}

async fn commit(tx: Box<dyn CourierTransaction>, courier_id: CourierId) -> DispatchResult<()> {
    tx.commit()
        .await
        .map_err(|e| DispatchError::from_transaction(courier_id, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{CourierRepository, OrderRepository};
    use crate::engine::clock::FixedClock;
    use crate::models::{Courier, CourierPatch, CourierType, RegionId, TimeWindow};
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 10, hour, minute, 0).unwrap()
    }

    async fn setup() -> (LocalRepository, AssignmentOrchestrator) {
        let repo = LocalRepository::new();
        repo.store_couriers(&[Courier::new(
            CourierId(1),
            CourierType::Foot,
            [RegionId(1), RegionId(12)],
            vec![TimeWindow::from_hm((11, 35), (14, 5))],
        )])
        .await
        .unwrap();
        repo.store_orders(&[
            Order::new(OrderId(1), 23, RegionId(12), vec![TimeWindow::from_hm((9, 0), (18, 0))]),
            Order::new(OrderId(2), 1500, RegionId(1), vec![TimeWindow::from_hm((9, 0), (18, 0))]),
            Order::new(OrderId(3), 50, RegionId(22), vec![TimeWindow::from_hm((9, 0), (12, 0))]),
            Order::new(OrderId(4), 100, RegionId(1), vec![TimeWindow::from_hm((14, 5), (15, 0))]),
            Order::new(OrderId(5), 400, RegionId(1), vec![TimeWindow::from_hm((12, 0), (13, 0))]),
        ])
        .await
        .unwrap();
        let orchestrator = AssignmentOrchestrator::with_clock(
            Arc::new(repo.clone()),
            Arc::new(FixedClock(at(12, 0))),
        );
        (repo, orchestrator)
    }

    #[tokio::test]
    async fn test_assign_selects_eligible_orders() {
        let (_repo, orchestrator) = setup().await;
        let batch = orchestrator.assign(CourierId(1)).await.unwrap();
        assert_eq!(batch.order_ids, vec![OrderId(1), OrderId(5)]);
        assert_eq!(batch.assigned_at, Some(at(12, 0)));
    }

    #[tokio::test]
    async fn test_assign_unknown_courier() {
        let (_repo, orchestrator) = setup().await;
        let err = orchestrator.assign(CourierId(99)).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reconcile_after_region_change() {
        let (repo, orchestrator) = setup().await;
        orchestrator.assign(CourierId(1)).await.unwrap();

        let patch = CourierPatch {
            regions: Some(vec![RegionId(1)]),
            ..Default::default()
        };
        repo.update_courier(CourierId(1), &patch).await.unwrap();
        let report = orchestrator.reconcile(CourierId(1)).await.unwrap();
        assert_eq!(report.released, vec![OrderId(1)]);
        assert_eq!(report.retained, vec![OrderId(5)]);

        let released = repo.get_order(OrderId(1)).await.unwrap();
        assert_eq!(released.assigned_courier, None);
        assert_eq!(released.assigned_at, None);
    }

    #[tokio::test]
    async fn test_complete_rules() {
        let (_repo, orchestrator) = setup().await;
        orchestrator.assign(CourierId(1)).await.unwrap();

        let err = orchestrator
            .complete(CourierId(1), OrderId(2), at(13, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidConstraint(_)));

        let err = orchestrator
            .complete(CourierId(1), OrderId(1), at(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidConstraint(_)));

        let done = orchestrator
            .complete(CourierId(1), OrderId(1), at(12, 30))
            .await
            .unwrap();
        assert_eq!(done.completed_at, Some(at(12, 30)));

        // second completion is a no-op
        let again = orchestrator
            .complete(CourierId(1), OrderId(1), at(13, 30))
            .await
            .unwrap();
        assert_eq!(again.completed_at, Some(at(12, 30)));

        let err = orchestrator
            .complete(CourierId(1), OrderId(42), at(13, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }
}
