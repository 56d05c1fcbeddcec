//! Order store operations outside the per-courier transaction.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{CourierId, Order, OrderId};

/// Repository trait for delivery orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Store new orders in one atomic step.
    ///
    /// # Returns
    /// * `Ok(Vec<OrderId>)` - Ids of the stored orders, in input order
    /// * `Err(RepositoryError::ValidationError)` - If any id is already taken
    ///   or repeated; nothing is stored in that case
    async fn store_orders(&self, orders: &[Order]) -> RepositoryResult<Vec<OrderId>>;

    /// Retrieve a single order.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the order doesn't exist
    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order>;

    /// Every order ever assigned to the courier, completed or not, by id.
    async fn orders_for_courier(&self, courier_id: CourierId) -> RepositoryResult<Vec<Order>>;
}
