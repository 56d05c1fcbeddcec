//! Profile store operations.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Courier, CourierId, CourierPatch};

/// Repository trait for courier profiles.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CourierRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store new couriers in one atomic step.
    ///
    /// # Returns
    /// * `Ok(Vec<CourierId>)` - Ids of the stored couriers, in input order
    /// * `Err(RepositoryError::ValidationError)` - If any id is already taken
    ///   or repeated; nothing is stored in that case
    async fn store_couriers(&self, couriers: &[Courier]) -> RepositoryResult<Vec<CourierId>>;

    /// Retrieve a courier profile.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the courier doesn't exist
    async fn get_courier(&self, courier_id: CourierId) -> RepositoryResult<Courier>;

    /// Apply a partial profile update and return the new profile.
    async fn update_courier(
        &self,
        courier_id: CourierId,
        patch: &CourierPatch,
    ) -> RepositoryResult<Courier>;
}
