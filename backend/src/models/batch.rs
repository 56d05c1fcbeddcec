use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::courier::CourierId;
use super::order::{Order, OrderId};

/// Orders handed to one courier by a single assignment, sharing one timestamp.
///
/// `order_ids` is always sorted ascending and free of duplicates. An empty
/// batch carries no timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentBatch {
    pub courier_id: CourierId,
    pub order_ids: Vec<OrderId>,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl AssignmentBatch {
    pub fn new(courier_id: CourierId, mut order_ids: Vec<OrderId>, assigned_at: DateTime<Utc>) -> Self {
        order_ids.sort_unstable();
        order_ids.dedup();
        Self {
            courier_id,
            order_ids,
            assigned_at: Some(assigned_at),
        }
    }

    pub fn empty(courier_id: CourierId) -> Self {
        Self {
            courier_id,
            order_ids: Vec::new(),
            assigned_at: None,
        }
    }

    /// Rebuild the open batch from the courier's undelivered orders.
    ///
    /// The batch timestamp is the earliest `assigned_at` among them.
    pub fn from_open_orders(courier_id: CourierId, orders: &[Order]) -> Self {
        if orders.is_empty() {
            return Self::empty(courier_id);
        }
        let mut order_ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        order_ids.sort_unstable();
        order_ids.dedup();
        Self {
            courier_id,
            order_ids,
            assigned_at: orders.iter().filter_map(|o| o.assigned_at).min(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order_ids.len()
    }

    /// Caller-facing shape: order id list plus an RFC 3339 timestamp.
    pub fn to_response(&self) -> AssignmentResponse {
        AssignmentResponse {
            orders: self.order_ids.iter().map(|&id| OrderRef { id }).collect(),
            assign_time: self
                .assigned_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    pub id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub orders: Vec<OrderRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_time: Option<String>,
}
