//! Repository trait definitions for the profile and order stores.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`courier`]: Courier profile CRUD
//! - [`order`]: Order CRUD and history
//! - [`assignment`]: Locked, transactional access for the assignment engine
//!
//! # Convenience Trait Bound
//!
//! Code that needs every capability uses the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let courier = repo.get_courier(courier_id).await?;
//!     let mut tx = repo.begin(courier.id).await?;
//!     // ...
//!     tx.commit().await
//! }
//! ```

pub mod assignment;
pub mod courier;
pub mod error;
pub mod order;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use assignment::{AssignmentRepository, CourierTransaction};
pub use courier::CourierRepository;
pub use order::OrderRepository;

/// Composite trait bound for a complete repository implementation.
pub trait FullRepository: CourierRepository + OrderRepository + AssignmentRepository {}

// Blanket implementation: any type implementing all three traits is a FullRepository
impl<T> FullRepository for T where T: CourierRepository + OrderRepository + AssignmentRepository {}
