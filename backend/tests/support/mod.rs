#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use courier_dispatch::db::repositories::LocalRepository;
use courier_dispatch::db::repository::{
    AssignmentRepository, CourierRepository, CourierTransaction, OrderRepository,
    RepositoryResult,
};
use courier_dispatch::engine::Clock;
use courier_dispatch::models::{
    Centiunits, Courier, CourierId, CourierPatch, CourierType, Order, OrderId, RegionId,
    TimeWindow,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =========================================================
// Fixtures
// =========================================================

pub fn window(text: &str) -> TimeWindow {
    text.parse().unwrap()
}

pub fn courier(id: i64, courier_type: CourierType, regions: &[i64], hours: &[&str]) -> Courier {
    Courier::new(
        CourierId(id),
        courier_type,
        regions.iter().map(|&r| RegionId(r)),
        hours.iter().map(|h| window(h)).collect(),
    )
}

pub fn order(id: i64, weight: Centiunits, region: i64, hours: &[&str]) -> Order {
    Order::new(
        OrderId(id),
        weight,
        RegionId(region),
        hours.iter().map(|h| window(h)).collect(),
    )
}

pub fn ids(raw: &[i64]) -> Vec<OrderId> {
    raw.iter().map(|&id| OrderId(id)).collect()
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 10, 10, 0, 0).unwrap()
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap();
        *now += by;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =========================================================
// Racing repository
// =========================================================

/// Repository whose first commit of a claim loses a race.
///
/// Right before the first claiming transaction commits, `rival` claims the
/// lowest order id it staged through the real store, so that commit hits a
/// genuine conflict. Later commits pass through untouched.
#[derive(Clone)]
pub struct RacingRepository {
    pub inner: LocalRepository,
    rival: CourierId,
    armed: Arc<AtomicBool>,
}

impl RacingRepository {
    pub fn new(inner: LocalRepository, rival: CourierId) -> Self {
        Self {
            inner,
            rival,
            armed: Arc::new(AtomicBool::new(true)),
        }
    }
}

#[async_trait]
impl CourierRepository for RacingRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn store_couriers(&self, couriers: &[Courier]) -> RepositoryResult<Vec<CourierId>> {
        self.inner.store_couriers(couriers).await
    }

    async fn get_courier(&self, courier_id: CourierId) -> RepositoryResult<Courier> {
        self.inner.get_courier(courier_id).await
    }

    async fn update_courier(
        &self,
        courier_id: CourierId,
        patch: &CourierPatch,
    ) -> RepositoryResult<Courier> {
        self.inner.update_courier(courier_id, patch).await
    }
}

#[async_trait]
impl OrderRepository for RacingRepository {
    async fn store_orders(&self, orders: &[Order]) -> RepositoryResult<Vec<OrderId>> {
        self.inner.store_orders(orders).await
    }

    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order> {
        self.inner.get_order(order_id).await
    }

    async fn orders_for_courier(&self, courier_id: CourierId) -> RepositoryResult<Vec<Order>> {
        self.inner.orders_for_courier(courier_id).await
    }
}

#[async_trait]
impl AssignmentRepository for RacingRepository {
    async fn begin(&self, courier_id: CourierId) -> RepositoryResult<Box<dyn CourierTransaction>> {
        let tx = self.inner.begin(courier_id).await?;
        Ok(Box::new(RacingTransaction {
            tx,
            repo: self.clone(),
            claimed: Vec::new(),
        }))
    }
}

struct RacingTransaction {
    tx: Box<dyn CourierTransaction>,
    repo: RacingRepository,
    claimed: Vec<OrderId>,
}

#[async_trait]
impl CourierTransaction for RacingTransaction {
    fn courier_id(&self) -> CourierId {
        self.tx.courier_id()
    }

    async fn courier(&mut self) -> RepositoryResult<Courier> {
        self.tx.courier().await
    }

    async fn open_orders(&mut self) -> RepositoryResult<Vec<Order>> {
        self.tx.open_orders().await
    }

    async fn unassigned_orders(&mut self) -> RepositoryResult<Vec<Order>> {
        self.tx.unassigned_orders().await
    }

    async fn order(&mut self, order_id: OrderId) -> RepositoryResult<Order> {
        self.tx.order(order_id).await
    }

    async fn claim_orders(
        &mut self,
        order_ids: &[OrderId],
        assigned_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.claimed.extend_from_slice(order_ids);
        self.tx.claim_orders(order_ids, assigned_at).await
    }

    async fn release_orders(&mut self, order_ids: &[OrderId]) -> RepositoryResult<()> {
        self.tx.release_orders(order_ids).await
    }

    async fn complete_order(
        &mut self,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.tx.complete_order(order_id, completed_at).await
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let this = *self;
        if let Some(&stolen) = this.claimed.iter().min() {
            if this.repo.armed.swap(false, Ordering::SeqCst) {
                let mut rival = this.repo.inner.begin(this.repo.rival).await?;
                rival.claim_orders(&[stolen], t0()).await?;
                rival.commit().await?;
            }
        }
        this.tx.commit().await
    }
}
