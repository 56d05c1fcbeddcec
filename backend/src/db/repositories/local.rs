//! In-memory local repository implementation.
//!
//! All data lives in ordered maps behind a single `RwLock`, which keeps reads
//! deterministic (id order) and lets a commit validate and apply a whole batch
//! of writes under one write guard. Per-courier advisory locks are async
//! mutexes held by open transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::db::repository::*;
use crate::models::{Courier, CourierId, CourierPatch, Order, OrderId};

/// In-memory local repository.
///
/// # Example
/// ```
/// use courier_dispatch::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.courier_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    locks: Arc<CourierLocks>,
    commit_failures: Arc<AtomicUsize>,
}

struct LocalData {
    couriers: BTreeMap<CourierId, Courier>,
    orders: BTreeMap<OrderId, Order>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            couriers: BTreeMap::new(),
            orders: BTreeMap::new(),
            is_healthy: true,
        }
    }
}

/// Advisory lock table keyed by courier id.
#[derive(Default)]
struct CourierLocks {
    table: Mutex<HashMap<CourierId, Arc<AsyncMutex<()>>>>,
}

impl CourierLocks {
    async fn acquire(self: &Arc<Self>, courier_id: CourierId) -> CourierLockGuard {
        let lock = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(courier_id).or_default())
        };
        CourierLockGuard {
            courier_id,
            locks: Arc::clone(self),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn len(&self) -> usize {
        self.table.lock().len()
    }
}

/// Held courier lock. Dropping it removes the table entry once no other
/// transaction holds or waits for the same courier.
struct CourierLockGuard {
    courier_id: CourierId,
    locks: Arc<CourierLocks>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CourierLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut table = self.locks.table.lock();
        if table
            .get(&self.courier_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.courier_id);
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            locks: Arc::new(CourierLocks::default()),
            commit_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make the next `count` commits fail with a transaction error.
    pub fn inject_commit_failures(&self, count: usize) {
        self.commit_failures.store(count, Ordering::SeqCst);
    }

    pub fn courier_count(&self) -> usize {
        self.data.read().couriers.len()
    }

    pub fn order_count(&self) -> usize {
        self.data.read().orders.len()
    }

    /// Snapshot of every stored order, by id.
    pub fn all_orders(&self) -> Vec<Order> {
        self.data.read().orders.values().cloned().collect()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Local store is not healthy"));
        }
        Ok(())
    }

    fn get_courier_impl(&self, courier_id: CourierId) -> RepositoryResult<Courier> {
        self.data
            .read()
            .couriers
            .get(&courier_id)
            .cloned()
            .ok_or_else(|| courier_not_found(courier_id))
    }

    fn get_order_impl(&self, order_id: OrderId) -> RepositoryResult<Order> {
        self.data
            .read()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| order_not_found(order_id))
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn courier_not_found(courier_id: CourierId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Courier {} not found", courier_id),
        ErrorContext::default()
            .with_entity("courier")
            .with_entity_id(courier_id),
    )
}

fn order_not_found(order_id: OrderId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Order {} not found", order_id),
        ErrorContext::default()
            .with_entity("order")
            .with_entity_id(order_id),
    )
}

/// Reject ids that repeat within `incoming` or already exist in `existing`.
fn check_new_ids<K: Ord + Copy + std::hash::Hash + std::fmt::Display, V>(
    incoming: &[K],
    existing: &BTreeMap<K, V>,
    entity: &str,
    operation: &str,
) -> RepositoryResult<()> {
    let mut seen = HashSet::with_capacity(incoming.len());
    for id in incoming {
        if !seen.insert(*id) || existing.contains_key(id) {
            return Err(RepositoryError::validation_with_context(
                format!("{} id {} is not unique", entity, id),
                ErrorContext::new(operation)
                    .with_entity(entity)
                    .with_entity_id(id),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl CourierRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_couriers(&self, couriers: &[Courier]) -> RepositoryResult<Vec<CourierId>> {
        self.check_health()?;
        let ids: Vec<CourierId> = couriers.iter().map(|c| c.id).collect();
        let mut data = self.data.write();
        check_new_ids(&ids, &data.couriers, "courier", "store_couriers")?;
        for courier in couriers {
            data.couriers.insert(courier.id, courier.clone());
        }
        Ok(ids)
    }

    async fn get_courier(&self, courier_id: CourierId) -> RepositoryResult<Courier> {
        self.check_health()?;
        self.get_courier_impl(courier_id)
    }

    async fn update_courier(
        &self,
        courier_id: CourierId,
        patch: &CourierPatch,
    ) -> RepositoryResult<Courier> {
        self.check_health()?;
        let mut data = self.data.write();
        let courier = data
            .couriers
            .get_mut(&courier_id)
            .ok_or_else(|| courier_not_found(courier_id).with_operation("update_courier"))?;
        courier.apply(patch);
        Ok(courier.clone())
    }
}

#[async_trait]
impl OrderRepository for LocalRepository {
    async fn store_orders(&self, orders: &[Order]) -> RepositoryResult<Vec<OrderId>> {
        self.check_health()?;
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut data = self.data.write();
        check_new_ids(&ids, &data.orders, "order", "store_orders")?;
        for order in orders {
            data.orders.insert(order.id, order.clone());
        }
        Ok(ids)
    }

    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order> {
        self.check_health()?;
        self.get_order_impl(order_id)
    }

    async fn orders_for_courier(&self, courier_id: CourierId) -> RepositoryResult<Vec<Order>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .orders
            .values()
            .filter(|o| o.assigned_courier == Some(courier_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentRepository for LocalRepository {
    async fn begin(&self, courier_id: CourierId) -> RepositoryResult<Box<dyn CourierTransaction>> {
        self.check_health()?;
        let guard = self.locks.acquire(courier_id).await;
        debug!(courier_id = %courier_id, "courier lock acquired");
        Ok(Box::new(LocalTransaction {
            repo: self.clone(),
            courier_id,
            claims: Vec::new(),
            releases: Vec::new(),
            completions: Vec::new(),
            _guard: guard,
        }))
    }
}

/// Staged writes plus the courier's lock guard.
struct LocalTransaction {
    repo: LocalRepository,
    courier_id: CourierId,
    claims: Vec<(OrderId, DateTime<Utc>)>,
    releases: Vec<OrderId>,
    completions: Vec<(OrderId, DateTime<Utc>)>,
    _guard: CourierLockGuard,
}

impl LocalTransaction {
    fn conflict(&self, order_id: OrderId, details: &str) -> RepositoryError {
        RepositoryError::conflict_with_context(
            format!("Order {} changed hands before commit", order_id),
            ErrorContext::new("commit")
                .with_entity("order")
                .with_entity_id(order_id)
                .with_details(format!("courier={}, {}", self.courier_id, details)),
        )
    }

    /// Check every staged write against the current state without mutating it.
    fn validate(&self, orders: &BTreeMap<OrderId, Order>) -> RepositoryResult<()> {
        for (order_id, _) in &self.claims {
            let order = orders
                .get(order_id)
                .ok_or_else(|| order_not_found(*order_id).with_operation("commit"))?;
            if order.assigned_courier.is_some() {
                return Err(self.conflict(*order_id, "claim of an assigned order"));
            }
        }
        for order_id in self.releases.iter().chain(self.completions.iter().map(|(id, _)| id)) {
            let order = orders
                .get(order_id)
                .ok_or_else(|| order_not_found(*order_id).with_operation("commit"))?;
            if !order.is_open_for(self.courier_id) {
                return Err(self.conflict(*order_id, "order is no longer open for courier"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CourierTransaction for LocalTransaction {
    fn courier_id(&self) -> CourierId {
        self.courier_id
    }

    async fn courier(&mut self) -> RepositoryResult<Courier> {
        self.repo.check_health()?;
        self.repo.get_courier_impl(self.courier_id)
    }

    async fn open_orders(&mut self) -> RepositoryResult<Vec<Order>> {
        self.repo.check_health()?;
        let courier_id = self.courier_id;
        Ok(self
            .repo
            .data
            .read()
            .orders
            .values()
            .filter(|o| o.is_open_for(courier_id))
            .cloned()
            .collect())
    }

    async fn unassigned_orders(&mut self) -> RepositoryResult<Vec<Order>> {
        self.repo.check_health()?;
        Ok(self
            .repo
            .data
            .read()
            .orders
            .values()
            .filter(|o| o.assigned_courier.is_none())
            .cloned()
            .collect())
    }

    async fn order(&mut self, order_id: OrderId) -> RepositoryResult<Order> {
        self.repo.check_health()?;
        self.repo.get_order_impl(order_id)
    }

    async fn claim_orders(
        &mut self,
        order_ids: &[OrderId],
        assigned_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.claims
            .extend(order_ids.iter().map(|&id| (id, assigned_at)));
        Ok(())
    }

    async fn release_orders(&mut self, order_ids: &[OrderId]) -> RepositoryResult<()> {
        self.releases.extend_from_slice(order_ids);
        Ok(())
    }

    async fn complete_order(
        &mut self,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.completions.push((order_id, completed_at));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        self.repo.check_health()?;

        let pending = self.repo.commit_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.repo.commit_failures.store(pending - 1, Ordering::SeqCst);
            return Err(RepositoryError::transaction_with_context(
                "Injected commit failure",
                ErrorContext::new("commit").with_entity_id(self.courier_id),
            ));
        }

        let mut data = self.repo.data.write();
        self.validate(&data.orders)?;

        for (order_id, assigned_at) in &self.claims {
            if let Some(order) = data.orders.get_mut(order_id) {
                order.assigned_courier = Some(self.courier_id);
                order.assigned_at = Some(*assigned_at);
            }
        }
        for order_id in &self.releases {
            if let Some(order) = data.orders.get_mut(order_id) {
                order.assigned_courier = None;
                order.assigned_at = None;
            }
        }
        for (order_id, completed_at) in &self.completions {
            if let Some(order) = data.orders.get_mut(order_id) {
                order.completed_at = Some(*completed_at);
            }
        }

        debug!(
            courier_id = %self.courier_id,
            claimed = self.claims.len(),
            released = self.releases.len(),
            completed = self.completions.len(),
            "courier transaction committed"
        );
        Ok(())
    }
}
