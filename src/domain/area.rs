//! Ordered group of slots within one zone

use crate::domain::slot::Slot;
use crate::domain::types::{AreaId, ReleaseFault, SlotId, ZoneId};

/// Fixed-capacity run of slots
///
/// Slots are created once at construction with IDs `1..=capacity` and never resized.
/// `available_slots` is maintained incrementally and always equals the number of
/// free slots.
#[derive(Debug, Clone)]
pub struct Area {
    area_id: AreaId,
    zone_id: ZoneId,
    slots: Box<[Slot]>,
    available_slots: u32,
}

impl Area {
    pub fn new(area_id: AreaId, zone_id: ZoneId, capacity: u32) -> Self {
        let slots = (1..=capacity).map(|i| Slot::new(SlotId(i), zone_id, area_id)).collect();
        Self { area_id, zone_id, slots, available_slots: capacity }
    }

    /// First free slot in slot order, without mutating anything
    pub fn find_available_slot(&self) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.is_available())
    }

    /// Park `vehicle_id` in the first free slot; `None` when the area is full
    pub fn allocate_slot(&mut self, vehicle_id: &str) -> Option<SlotId> {
        let slot = self.slots.iter_mut().find(|slot| slot.is_available())?;
        slot.allocate(vehicle_id);
        self.available_slots -= 1;
        Some(slot.slot_id())
    }

    /// Free an occupied slot
    ///
    /// Releasing a free slot is an error, not a no-op.
    pub fn release_slot(&mut self, slot_id: SlotId) -> Result<(), ReleaseFault> {
        let idx = (slot_id.0 as usize).checked_sub(1).ok_or(ReleaseFault::InvalidSlot)?;
        let slot = self.slots.get_mut(idx).ok_or(ReleaseFault::InvalidSlot)?;
        if slot.is_available() {
            return Err(ReleaseFault::AlreadyFree);
        }
        slot.release();
        self.available_slots += 1;
        Ok(())
    }

    #[inline]
    pub fn area_id(&self) -> AreaId {
        self.area_id
    }

    #[inline]
    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    #[inline]
    pub fn available_slots(&self) -> u32 {
        self.available_slots
    }

    #[inline]
    pub fn total_slots(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look up a slot by its 1-based ID
    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        let idx = (slot_id.0 as usize).checked_sub(1)?;
        self.slots.get(idx)
    }
}
