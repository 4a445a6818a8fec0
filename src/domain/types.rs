//! Shared types for the parking allocator

use serde::{Deserialize, Serialize};

/// Newtype wrapper for zone IDs (1-based position in the topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ZoneId(pub u32);

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ZoneId {
    /// Zero-based index into a zone slice, if this ID lies in `1..=count`
    #[inline]
    pub fn index(self, count: usize) -> Option<usize> {
        let idx = (self.0 as usize).checked_sub(1)?;
        (idx < count).then_some(idx)
    }
}

/// Newtype wrapper for area IDs (1-based within the owning zone)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AreaId(pub u32);

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for slot IDs (1-based within the owning area)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SlotId(pub u32);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which fallback tier produced a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Requested zone had room
    Home,
    /// A zone declared adjacent to the requested one had room
    Adjacent,
    /// Any other zone, scanned in ascending order
    Global,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Home => "home",
            Tier::Adjacent => "adjacent",
            Tier::Global => "global",
        }
    }
}

/// Why a zone or area refused to release a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseFault {
    /// Area ID outside the zone's area range
    InvalidArea,
    /// Slot ID outside the area's slot range
    InvalidSlot,
    /// Slot exists but is not occupied
    AlreadyFree,
}

/// Where a vehicle was parked and what it cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub zone_id: ZoneId,
    pub area_id: AreaId,
    pub slot_id: SlotId,
    pub penalty: f64,
    pub tier: Tier,
}

/// Penalty scores applied to the two fallback tiers
///
/// Invariant: `0 <= cross_zone < non_adjacent`, both finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Penalties {
    cross_zone: f64,
    non_adjacent: f64,
}

pub const DEFAULT_CROSS_ZONE_PENALTY: f64 = 15.0;
pub const DEFAULT_NON_ADJACENT_PENALTY: f64 = 25.0;

impl Penalties {
    /// Returns `None` when the values break the ordering invariant
    pub fn new(cross_zone: f64, non_adjacent: f64) -> Option<Self> {
        let valid = cross_zone.is_finite()
            && non_adjacent.is_finite()
            && cross_zone >= 0.0
            && cross_zone < non_adjacent;
        valid.then_some(Self { cross_zone, non_adjacent })
    }

    #[inline]
    pub fn cross_zone(&self) -> f64 {
        self.cross_zone
    }

    #[inline]
    pub fn non_adjacent(&self) -> f64 {
        self.non_adjacent
    }

    /// Penalty charged for a placement in the given tier
    pub fn for_tier(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Home => 0.0,
            Tier::Adjacent => self.cross_zone,
            Tier::Global => self.non_adjacent,
        }
    }
}

impl Default for Penalties {
    fn default() -> Self {
        Self { cross_zone: DEFAULT_CROSS_ZONE_PENALTY, non_adjacent: DEFAULT_NON_ADJACENT_PENALTY }
    }
}

/// Vehicle record as held by the registry
///
/// The allocator only ever sees the ID and the preferred zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,
    pub preferred_zone: ZoneId,
}

impl Vehicle {
    pub fn new(vehicle_id: impl Into<String>, preferred_zone: ZoneId) -> Self {
        Self { vehicle_id: vehicle_id.into(), preferred_zone }
    }
}
