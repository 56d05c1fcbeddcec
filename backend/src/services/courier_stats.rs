//! Courier earnings and rating.
//!
//! Both figures are derived from the courier's order history: a batch is the
//! group of orders sharing one `assigned_at`, and it pays out only once every
//! order in it has been delivered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{CourierRecord, CourierType, Order, RegionId};

/// Base pay for one completed batch, multiplied by the type coefficient.
pub const BATCH_BASE_PAY: i64 = 500;

/// Average delivery time at or above which the rating bottoms out, in seconds.
pub const RATING_HORIZON_SECS: f64 = 3600.0;

pub const MAX_RATING: f64 = 5.0;

/// Courier profile with derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierProfile {
    #[serde(flatten)]
    pub courier: CourierRecord,
    pub earnings: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Number of batches whose orders have all been delivered.
pub fn completed_batches(orders: &[Order]) -> usize {
    let mut batches: BTreeMap<_, bool> = BTreeMap::new();
    for order in orders {
        if let Some(assigned_at) = order.assigned_at {
            let done = batches.entry(assigned_at).or_insert(true);
            *done &= order.completed_at.is_some();
        }
    }
    batches.values().filter(|&&done| done).count()
}

pub fn earnings(courier_type: CourierType, orders: &[Order]) -> i64 {
    completed_batches(orders) as i64 * BATCH_BASE_PAY * courier_type.earnings_coefficient()
}

/// Rating in `[0, 5]`, rounded to two decimals, or `None` before the first
/// delivery.
///
/// For every region the delivery times (`completed_at - assigned_at`) are
/// averaged; the fastest region average, rounded half-to-even to whole
/// seconds as `t`, gives `(3600 - min(t, 3600)) / 3600 * 5`.
pub fn rating(orders: &[Order]) -> Option<f64> {
    let mut per_region: BTreeMap<RegionId, (f64, u32)> = BTreeMap::new();
    for order in orders {
        if let (Some(assigned_at), Some(completed_at)) = (order.assigned_at, order.completed_at) {
            let seconds = (completed_at - assigned_at).num_milliseconds() as f64 / 1000.0;
            let entry = per_region.entry(order.region).or_insert((0.0, 0));
            entry.0 += seconds;
            entry.1 += 1;
        }
    }

    let fastest = per_region
        .values()
        .map(|(total, count)| total / f64::from(*count))
        .min_by(|a, b| a.total_cmp(b))?
        .round_ties_even();

    let score = (RATING_HORIZON_SECS - fastest.min(RATING_HORIZON_SECS)) / RATING_HORIZON_SECS
        * MAX_RATING;
    Some((score * 100.0).round() / 100.0)
}
