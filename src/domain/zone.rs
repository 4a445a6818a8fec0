//! Zone: ordered areas plus directed adjacency
//!
//! A zone aggregates the slot counts of its areas and keeps them consistent
//! incrementally on every allocate/release. Adjacency is directed exactly as
//! declared; the zone never mirrors a declaration back.

use crate::domain::area::Area;
use crate::domain::slot::Slot;
use crate::domain::types::{AreaId, ReleaseFault, SlotId, ZoneId};
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct Zone {
    zone_id: ZoneId,
    name: String,
    areas: Box<[Area]>,
    /// Declared neighbours, in declaration order
    adjacent: SmallVec<[ZoneId; 4]>,
    /// Upper bound on `adjacent` (total zone count - 1)
    adjacency_limit: usize,
    total_slots: u32,
    available_slots: u32,
}

impl Zone {
    /// Build a zone with one area per entry of `area_capacities` (area IDs `1..=n`)
    pub fn new(
        zone_id: ZoneId,
        name: impl Into<String>,
        area_capacities: &[u32],
        adjacency_limit: usize,
    ) -> Self {
        let areas: Box<[Area]> = area_capacities
            .iter()
            .zip(1..)
            .map(|(&capacity, area_id)| Area::new(AreaId(area_id), zone_id, capacity))
            .collect();
        let total_slots = areas.iter().map(Area::total_slots).sum();
        Self {
            zone_id,
            name: name.into(),
            areas,
            adjacent: SmallVec::new(),
            adjacency_limit,
            total_slots,
            available_slots: total_slots,
        }
    }

    #[inline]
    pub fn has_available_slot(&self) -> bool {
        self.available_slots > 0
    }

    /// First free slot, by area order then slot order
    pub fn find_available_slot(&self) -> Option<&Slot> {
        self.areas.iter().find_map(Area::find_available_slot)
    }

    /// Park `vehicle_id` in the first free slot of this zone
    ///
    /// Returns the `(area, slot)` pair that was taken, or `None` when full.
    pub fn allocate_slot(&mut self, vehicle_id: &str) -> Option<(AreaId, SlotId)> {
        let area = self.areas.iter_mut().find(|area| area.available_slots() > 0)?;
        let slot_id = area.allocate_slot(vehicle_id)?;
        self.available_slots -= 1;
        Some((area.area_id(), slot_id))
    }

    /// Free `slot_id` in `area_id`; no state changes on failure
    pub fn release_slot(&mut self, slot_id: SlotId, area_id: AreaId) -> Result<(), ReleaseFault> {
        let idx = (area_id.0 as usize).checked_sub(1).ok_or(ReleaseFault::InvalidArea)?;
        let area = self.areas.get_mut(idx).ok_or(ReleaseFault::InvalidArea)?;
        area.release_slot(slot_id)?;
        self.available_slots += 1;
        Ok(())
    }

    /// Declare `zone_id` adjacent to this zone
    ///
    /// Ignored once the adjacency list is at its limit. Returns whether it was added.
    pub fn add_adjacent_zone(&mut self, zone_id: ZoneId) -> bool {
        if self.adjacent.len() >= self.adjacency_limit {
            return false;
        }
        self.adjacent.push(zone_id);
        true
    }

    /// Percentage of occupied slots, 0.0 for a zone without slots
    pub fn utilization(&self) -> f64 {
        if self.total_slots == 0 {
            return 0.0;
        }
        f64::from(self.total_slots - self.available_slots) * 100.0 / f64::from(self.total_slots)
    }

    #[inline]
    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn total_slots(&self) -> u32 {
        self.total_slots
    }

    #[inline]
    pub fn available_slots(&self) -> u32 {
        self.available_slots
    }

    pub fn adjacent_zones(&self) -> &[ZoneId] {
        &self.adjacent
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Look up an area by its 1-based ID
    pub fn area(&self, area_id: AreaId) -> Option<&Area> {
        let idx = (area_id.0 as usize).checked_sub(1)?;
        self.areas.get(idx)
    }
}
