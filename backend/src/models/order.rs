use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::courier::{CourierId, RegionId};
use super::time::TimeWindow;
use super::weight::{kilograms_to_centiunits, Centiunits};

crate::define_id_type!(i64, OrderId);

/// Lifecycle position of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Unassigned,
    Assigned,
    Completed,
}

/// Delivery order as held by the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub weight: Centiunits,
    pub region: RegionId,
    pub delivery_hours: Vec<TimeWindow>,
    #[serde(default)]
    pub assigned_courier: Option<CourierId>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create an unassigned order.
    pub fn new(
        id: OrderId,
        weight: Centiunits,
        region: RegionId,
        delivery_hours: Vec<TimeWindow>,
    ) -> Self {
        Self {
            id,
            weight,
            region,
            delivery_hours,
            assigned_courier: None,
            assigned_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> OrderStatus {
        match (self.assigned_courier, self.completed_at) {
            (None, _) => OrderStatus::Unassigned,
            (Some(_), None) => OrderStatus::Assigned,
            (Some(_), Some(_)) => OrderStatus::Completed,
        }
    }

    /// Assigned to `courier_id` and not yet delivered.
    pub fn is_open_for(&self, courier_id: CourierId) -> bool {
        self.assigned_courier == Some(courier_id) && self.completed_at.is_none()
    }
}

/// Order record in the import wire format (weight in kilograms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub weight: f64,
    pub region: RegionId,
    pub delivery_hours: Vec<TimeWindow>,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order::new(
            record.order_id,
            kilograms_to_centiunits(record.weight),
            record.region,
            record.delivery_hours,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let mut order = Order::new(OrderId(1), 100, RegionId(1), vec![]);
        assert_eq!(order.status(), OrderStatus::Unassigned);

        order.assigned_courier = Some(CourierId(9));
        order.assigned_at = Some(Utc::now());
        assert_eq!(order.status(), OrderStatus::Assigned);
        assert!(order.is_open_for(CourierId(9)));
        assert!(!order.is_open_for(CourierId(8)));

        order.completed_at = Some(Utc::now());
        assert_eq!(order.status(), OrderStatus::Completed);
        assert!(!order.is_open_for(CourierId(9)));
    }

    #[test]
    fn test_record_scales_weight() {
        let json = r#"{"order_id": 4, "weight": 0.23, "region": 12, "delivery_hours": ["09:00-18:00"]}"#;
        let record: OrderRecord = serde_json::from_str(json).unwrap();
        let order = Order::from(record);
        assert_eq!(order.weight, 23);
        assert_eq!(order.status(), OrderStatus::Unassigned);
    }
}
