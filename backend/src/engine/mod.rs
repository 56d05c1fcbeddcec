//! Order assignment engine.
//!
//! - [`interval`]: time-window overlap
//! - [`availability`]: which orders a courier may carry
//! - [`knapsack`]: capacity-constrained selection
//! - [`orchestrator`]: per-courier assign / reconcile / complete lifecycle
//!
//! The first three are pure functions over model values; only the
//! orchestrator touches the repositories.

pub mod availability;
pub mod clock;
pub mod error;
pub mod interval;
pub mod knapsack;
pub mod orchestrator;

pub use availability::{candidate_orders, eligible_orders, is_eligible};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DispatchError, DispatchResult};
pub use interval::{any_overlap, overlaps};
pub use knapsack::{select, KnapsackItem, KnapsackResolver, KnapsackSolution};
pub use orchestrator::{AssignmentOrchestrator, ReconcileReport};
