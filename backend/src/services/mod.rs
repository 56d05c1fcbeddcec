//! Service layer for business logic and orchestration.
//!
//! This module sits between callers and the assignment engine / repositories.

pub mod courier_stats;
pub mod dispatch;

pub use courier_stats::CourierProfile;
pub use dispatch::{
    assign_orders, complete_order, get_courier_profile, health_check, import_couriers,
    import_orders, update_courier, CourierUpdate,
};
