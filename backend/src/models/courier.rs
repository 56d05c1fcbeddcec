use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::time::TimeWindow;
use super::weight::Centiunits;

crate::define_id_type!(i64, CourierId);
crate::define_id_type!(i64, RegionId);

/// Means of transport, which fixes carrying capacity and pay rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourierType {
    Foot,
    Bike,
    Car,
}

impl CourierType {
    /// Maximum batch weight in centiunits.
    pub fn carrying_capacity(&self) -> Centiunits {
        match self {
            CourierType::Foot => 1000,
            CourierType::Bike => 1500,
            CourierType::Car => 5000,
        }
    }

    /// Multiplier applied to the base pay of every completed batch.
    pub fn earnings_coefficient(&self) -> i64 {
        match self {
            CourierType::Foot => 2,
            CourierType::Bike => 5,
            CourierType::Car => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CourierType::Foot => "foot",
            CourierType::Bike => "bike",
            CourierType::Car => "car",
        }
    }
}

impl fmt::Display for CourierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "foot" => Ok(Self::Foot),
            "bike" => Ok(Self::Bike),
            "car" => Ok(Self::Car),
            _ => Err(format!("Unknown courier type: {}", s)),
        }
    }
}

/// Courier profile as held by the profile store.
///
/// `carrying_capacity` is derived from `courier_type` whenever the type is
/// set; the assignment engine only ever reads the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    pub id: CourierId,
    pub courier_type: CourierType,
    pub regions: BTreeSet<RegionId>,
    pub working_hours: Vec<TimeWindow>,
    pub carrying_capacity: Centiunits,
}

impl Courier {
    pub fn new(
        id: CourierId,
        courier_type: CourierType,
        regions: impl IntoIterator<Item = RegionId>,
        working_hours: Vec<TimeWindow>,
    ) -> Self {
        Self {
            id,
            courier_type,
            regions: regions.into_iter().collect(),
            working_hours,
            carrying_capacity: courier_type.carrying_capacity(),
        }
    }

    /// Apply a partial profile update in place.
    pub fn apply(&mut self, patch: &CourierPatch) {
        if let Some(courier_type) = patch.courier_type {
            self.courier_type = courier_type;
            self.carrying_capacity = courier_type.carrying_capacity();
        }
        if let Some(regions) = &patch.regions {
            self.regions = regions.iter().copied().collect();
        }
        if let Some(working_hours) = &patch.working_hours {
            self.working_hours = working_hours.clone();
        }
    }
}

/// Partial update of a courier profile. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_type: Option<CourierType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<Vec<TimeWindow>>,
}

impl CourierPatch {
    pub fn is_empty(&self) -> bool {
        self.courier_type.is_none() && self.regions.is_none() && self.working_hours.is_none()
    }
}

/// Courier record in the import wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierRecord {
    pub courier_id: CourierId,
    pub courier_type: CourierType,
    pub regions: Vec<RegionId>,
    pub working_hours: Vec<TimeWindow>,
}

impl From<CourierRecord> for Courier {
    fn from(record: CourierRecord) -> Self {
        Courier::new(
            record.courier_id,
            record.courier_type,
            record.regions,
            record.working_hours,
        )
    }
}

impl From<&Courier> for CourierRecord {
    fn from(courier: &Courier) -> Self {
        Self {
            courier_id: courier.id,
            courier_type: courier.courier_type,
            regions: courier.regions.iter().copied().collect(),
            working_hours: courier.working_hours.clone(),
        }
    }
}
