//! A single parking space

use crate::domain::types::{AreaId, SlotId, ZoneId};

/// One assignable parking space
///
/// Invariant: `occupant` is `Some` exactly when the slot is occupied.
#[derive(Debug, Clone)]
pub struct Slot {
    slot_id: SlotId,
    zone_id: ZoneId,
    area_id: AreaId,
    occupant: Option<String>,
}

impl Slot {
    pub fn new(slot_id: SlotId, zone_id: ZoneId, area_id: AreaId) -> Self {
        Self { slot_id, zone_id, area_id, occupant: None }
    }

    /// Park `vehicle_id` here
    ///
    /// Silent no-op if already occupied; returns whether the slot was taken.
    pub fn allocate(&mut self, vehicle_id: &str) -> bool {
        if self.occupant.is_some() {
            return false;
        }
        self.occupant = Some(vehicle_id.to_string());
        true
    }

    /// Free the slot (idempotent at this level)
    pub fn release(&mut self) {
        self.occupant = None;
    }

    #[inline]
    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    #[inline]
    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    #[inline]
    pub fn area_id(&self) -> AreaId {
        self.area_id
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.occupant.is_none()
    }

    /// Occupant tag, `None` when free
    pub fn vehicle_id(&self) -> Option<&str> {
        self.occupant.as_deref()
    }
}
