//! Per-courier transactional access used by the assignment engine.
//!
//! A [`CourierTransaction`] holds the courier's advisory lock from
//! [`AssignmentRepository::begin`] until it is committed or dropped. Reads see
//! the committed state of the store. Writes are staged and applied together by
//! [`CourierTransaction::commit`]; dropping the transaction instead discards
//! them, which is how both rollback and caller cancellation are expressed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{Courier, CourierId, Order, OrderId};

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Acquire the courier's lock and open a transaction scope.
    ///
    /// Waits while another transaction for the same courier is open.
    /// Transactions for different couriers never wait on each other.
    async fn begin(&self, courier_id: CourierId) -> RepositoryResult<Box<dyn CourierTransaction>>;
}

/// Unit of work scoped to one courier.
#[async_trait]
pub trait CourierTransaction: Send {
    fn courier_id(&self) -> CourierId;

    /// Snapshot of the courier profile.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the courier doesn't exist
    async fn courier(&mut self) -> RepositoryResult<Courier>;

    /// Orders assigned to this courier and not yet completed, by id.
    async fn open_orders(&mut self) -> RepositoryResult<Vec<Order>>;

    /// Orders nobody holds, by id.
    async fn unassigned_orders(&mut self) -> RepositoryResult<Vec<Order>>;

    /// Snapshot of any order.
    async fn order(&mut self, order_id: OrderId) -> RepositoryResult<Order>;

    /// Stage claiming `order_ids` for this courier at `assigned_at`.
    ///
    /// At commit every claimed order must still be unassigned, otherwise the
    /// whole commit fails with `RepositoryError::Conflict`.
    async fn claim_orders(
        &mut self,
        order_ids: &[OrderId],
        assigned_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Stage returning `order_ids` to the unassigned pool.
    ///
    /// At commit every released order must still be open for this courier.
    async fn release_orders(&mut self, order_ids: &[OrderId]) -> RepositoryResult<()>;

    /// Stage recording delivery of `order_id` at `completed_at`.
    async fn complete_order(
        &mut self,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Apply every staged write atomically and release the lock.
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;
}
