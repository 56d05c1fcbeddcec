//! Candidate screening for a single courier.
//!
//! An order is eligible for a courier when its region is one the courier
//! serves, one of its delivery windows overlaps one of the courier's working
//! windows, and it is not heavier than the courier's carrying capacity on its
//! own. A candidate is an eligible order that nobody has claimed yet.

use super::interval::any_overlap;
use crate::models::{Centiunits, Courier, Order};

/// Negative weights and capacities are read as zero.
pub(crate) fn non_negative(value: Centiunits) -> Centiunits {
    value.max(0)
}

/// Region, time-window and single-order weight check, ignoring assignment.
pub fn is_eligible(courier: &Courier, order: &Order) -> bool {
    courier.regions.contains(&order.region)
        && any_overlap(&courier.working_hours, &order.delivery_hours)
        && non_negative(order.weight) <= non_negative(courier.carrying_capacity)
}

/// Orders of `orders` the courier may carry, in input order.
///
/// A courier without working hours or without regions is eligible for
/// nothing.
pub fn eligible_orders<'a>(courier: &Courier, orders: &'a [Order]) -> Vec<&'a Order> {
    if courier.working_hours.is_empty() || courier.regions.is_empty() {
        return Vec::new();
    }
    orders
        .iter()
        .filter(|order| is_eligible(courier, order))
        .collect()
}

/// Unassigned orders of `pool` the courier may carry, in pool order.
pub fn candidate_orders<'a>(courier: &Courier, pool: &'a [Order]) -> Vec<&'a Order> {
    if courier.working_hours.is_empty() || courier.regions.is_empty() {
        return Vec::new();
    }
    pool.iter()
        .filter(|order| order.assigned_courier.is_none() && is_eligible(courier, order))
        .collect()
}
