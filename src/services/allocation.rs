//! Tiered placement of vehicles into zones
//!
//! A request is served by the first tier that finds room:
//! 1. Home: the requested zone itself (no penalty)
//! 2. Adjacent: zones declared adjacent to the requested one, in declaration order
//! 3. Global: every zone in ascending ID order
//!
//! An out-of-range requested zone skips straight to the global scan. Each
//! candidate zone is checked and mutated as one step, and nothing changes when
//! every tier comes up empty.

use crate::domain::types::{AreaId, Penalties, Placement, SlotId, Tier, ZoneId};
use crate::domain::zone::Zone;
use crate::infra::metrics::AllocationMetrics;
use crate::services::error::{AllocationError, Result};
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Allocation engine over a zone topology owned elsewhere
///
/// Zones are addressed by position: the zone at index `i` is `ZoneId(i + 1)`.
pub struct AllocationEngine<'a> {
    zones: &'a mut [Zone],
    penalties: Penalties,
    metrics: Option<Arc<AllocationMetrics>>,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(zones: &'a mut [Zone], penalties: Penalties) -> Self {
        Self { zones, penalties, metrics: None }
    }

    /// Record placements, releases and decision latency into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<AllocationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Place `vehicle_id`, preferring `requested_zone`
    ///
    /// The vehicle ID is an opaque tag; empty and duplicate IDs are accepted.
    pub fn allocate_park(&mut self, vehicle_id: &str, requested_zone: ZoneId) -> Result<Placement> {
        let started = Instant::now();
        let result = self.place(vehicle_id, requested_zone);

        if let Some(ref metrics) = self.metrics {
            metrics.record_decision_latency(started.elapsed().as_micros() as u64);
            match &result {
                Ok(placement) => metrics.record_placement(placement.tier, placement.penalty),
                Err(_) => metrics.record_rejected(),
            }
        }

        match &result {
            Ok(placement) => info!(
                vehicle_id = %vehicle_id,
                requested_zone = %requested_zone,
                zone_id = %placement.zone_id,
                area_id = %placement.area_id,
                slot_id = %placement.slot_id,
                tier = %placement.tier.as_str(),
                penalty = %placement.penalty,
                "parking_allocated"
            ),
            Err(e) => warn!(
                vehicle_id = %vehicle_id,
                requested_zone = %requested_zone,
                reason = %e.as_str(),
                "parking_rejected"
            ),
        }

        result
    }

    fn place(&mut self, vehicle_id: &str, requested_zone: ZoneId) -> Result<Placement> {
        if let Some(home) = requested_zone.index(self.zones.len()) {
            if let Some(placement) = self.try_zone(home, vehicle_id, Tier::Home) {
                return Ok(placement);
            }

            // Copied out so the neighbours can be mutated while iterating
            let adjacent: SmallVec<[ZoneId; 4]> =
                SmallVec::from_slice(self.zones[home].adjacent_zones());
            for zone_id in adjacent {
                let Some(idx) = zone_id.index(self.zones.len()) else {
                    debug!(
                        requested_zone = %requested_zone,
                        adjacent_zone = %zone_id,
                        "adjacent_zone_out_of_range"
                    );
                    continue;
                };
                if let Some(placement) = self.try_zone(idx, vehicle_id, Tier::Adjacent) {
                    return Ok(placement);
                }
            }
        }

        for idx in 0..self.zones.len() {
            if let Some(placement) = self.try_zone(idx, vehicle_id, Tier::Global) {
                return Ok(placement);
            }
        }

        Err(AllocationError::NoCapacity)
    }

    /// Check-then-allocate on a single zone
    fn try_zone(&mut self, idx: usize, vehicle_id: &str, tier: Tier) -> Option<Placement> {
        let zone = &mut self.zones[idx];
        if !zone.has_available_slot() {
            return None;
        }
        let (area_id, slot_id) = zone.allocate_slot(vehicle_id)?;
        Some(Placement {
            zone_id: ZoneId(idx as u32 + 1),
            area_id,
            slot_id,
            penalty: self.penalties.for_tier(tier),
            tier,
        })
    }

    /// Free the slot at `(zone_id, slot_id, area_id)`
    ///
    /// Releasing a slot that is already free is an error.
    pub fn release_park(&mut self, zone_id: ZoneId, slot_id: SlotId, area_id: AreaId) -> Result<()> {
        let result = match zone_id.index(self.zones.len()) {
            Some(idx) => self.zones[idx]
                .release_slot(slot_id, area_id)
                .map_err(|fault| AllocationError::from_release(fault, zone_id, area_id, slot_id)),
            None => Err(AllocationError::InvalidZone(zone_id)),
        };

        if let Some(ref metrics) = self.metrics {
            metrics.record_release(result.is_ok());
        }

        match &result {
            Ok(()) => info!(
                zone_id = %zone_id,
                area_id = %area_id,
                slot_id = %slot_id,
                "parking_released"
            ),
            Err(e) => warn!(
                zone_id = %zone_id,
                area_id = %area_id,
                slot_id = %slot_id,
                reason = %e.as_str(),
                "release_rejected"
            ),
        }

        result
    }

    pub fn zones(&self) -> &[Zone] {
        &*self.zones
    }

    pub fn zone(&self, zone_id: ZoneId) -> Option<&Zone> {
        zone_id.index(self.zones.len()).map(|idx| &self.zones[idx])
    }

    pub fn penalties(&self) -> Penalties {
        self.penalties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::area::Area;

    /// Build zones with the given area capacities and directed adjacency pairs
    fn build_zones(capacities: &[&[u32]], adjacency: &[(u32, u32)]) -> Vec<Zone> {
        let limit = capacities.len().saturating_sub(1);
        let mut zones: Vec<Zone> = capacities
            .iter()
            .zip(1..)
            .map(|(caps, id)| Zone::new(ZoneId(id), format!("Z{id}"), caps, limit))
            .collect();
        for &(from, to) in adjacency {
            zones[from as usize - 1].add_adjacent_zone(ZoneId(to));
        }
        zones
    }

    fn assert_counts_consistent(zones: &[Zone]) {
        for zone in zones {
            let mut zone_free = 0;
            for area in zone.areas() {
                let free = area.slots().iter().filter(|s| s.is_available()).count() as u32;
                assert_eq!(area.available_slots(), free);
                zone_free += free;
            }
            assert_eq!(zone.available_slots(), zone_free);
        }
    }

    #[test]
    fn test_single_zone_fills_then_rejects() {
        let mut zones = build_zones(&[&[2]], &[]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let first = engine.allocate_park("V1", ZoneId(1)).unwrap();
        assert_eq!((first.zone_id, first.area_id, first.slot_id), (ZoneId(1), AreaId(1), SlotId(1)));
        assert_eq!(first.penalty, 0.0);
        assert_eq!(first.tier, Tier::Home);

        let second = engine.allocate_park("V2", ZoneId(1)).unwrap();
        assert_eq!(second.slot_id, SlotId(2));
        assert_eq!(second.penalty, 0.0);

        assert_eq!(engine.allocate_park("V3", ZoneId(1)), Err(AllocationError::NoCapacity));
        assert_counts_consistent(engine.zones());
    }

    #[test]
    fn test_full_zone_spills_to_adjacent() {
        let mut zones = build_zones(&[&[0], &[1]], &[(1, 2)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let placement = engine.allocate_park("V1", ZoneId(1)).unwrap();
        assert_eq!(placement.zone_id, ZoneId(2));
        assert_eq!(placement.tier, Tier::Adjacent);
        assert_eq!(placement.penalty, engine.penalties().cross_zone());
    }

    #[test]
    fn test_adjacent_preferred_over_lower_global_zone() {
        // Zone 1 has room but is not adjacent to zone 2; zone 3 is
        let mut zones = build_zones(&[&[1], &[0], &[1]], &[(2, 3)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let placement = engine.allocate_park("V1", ZoneId(2)).unwrap();
        assert_eq!(placement.zone_id, ZoneId(3));
        assert_eq!(placement.tier, Tier::Adjacent);
    }

    #[test]
    fn test_adjacency_declaration_order() {
        let mut zones = build_zones(&[&[0], &[1], &[1]], &[(1, 3), (1, 2)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        assert_eq!(engine.allocate_park("V1", ZoneId(1)).unwrap().zone_id, ZoneId(3));
        assert_eq!(engine.allocate_park("V2", ZoneId(1)).unwrap().zone_id, ZoneId(2));
    }

    #[test]
    fn test_adjacency_is_not_transitive() {
        // 1 -> 2 -> 3, zone 2 full: request for 1 must not take the adjacent tier via 3
        let mut zones = build_zones(&[&[0], &[0], &[1]], &[(1, 2), (2, 3)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let placement = engine.allocate_park("V1", ZoneId(1)).unwrap();
        assert_eq!(placement.zone_id, ZoneId(3));
        assert_eq!(placement.tier, Tier::Global);
        assert_eq!(placement.penalty, engine.penalties().non_adjacent());
    }

    #[test]
    fn test_adjacency_is_directed() {
        // 2 declares 1 adjacent, but 1 declares nothing
        let mut zones = build_zones(&[&[0], &[0], &[1], &[1]], &[(2, 1), (1, 4)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let placement = engine.allocate_park("V1", ZoneId(2)).unwrap();
        assert_eq!(placement.zone_id, ZoneId(3));
        assert_eq!(placement.tier, Tier::Global);
    }

    #[test]
    fn test_global_fallback_lowest_zone() {
        let mut zones = build_zones(&[&[0], &[2], &[1], &[1]], &[(1, 3)]);
        // Fill the adjacent zone first
        zones[2].allocate_slot("X");
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let placement = engine.allocate_park("V1", ZoneId(1)).unwrap();
        assert_eq!(placement.zone_id, ZoneId(2));
        assert_eq!(placement.tier, Tier::Global);
        assert_eq!(placement.penalty, 25.0);
    }

    #[test]
    fn test_out_of_range_request_goes_global() {
        let mut zones = build_zones(&[&[1], &[1]], &[]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let zero = engine.allocate_park("V1", ZoneId(0)).unwrap();
        assert_eq!((zero.zone_id, zero.tier), (ZoneId(1), Tier::Global));

        let beyond = engine.allocate_park("V2", ZoneId(9)).unwrap();
        assert_eq!((beyond.zone_id, beyond.tier), (ZoneId(2), Tier::Global));
        assert_eq!(beyond.penalty, 25.0);
    }

    #[test]
    fn test_out_of_range_adjacency_is_skipped() {
        let mut zones = build_zones(&[&[0], &[1]], &[]);
        zones[0].add_adjacent_zone(ZoneId(7));
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let placement = engine.allocate_park("V1", ZoneId(1)).unwrap();
        assert_eq!((placement.zone_id, placement.tier), (ZoneId(2), Tier::Global));
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        let mut zones = build_zones(&[&[1], &[1]], &[(1, 2)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());
        engine.allocate_park("V1", ZoneId(1)).unwrap();
        engine.allocate_park("V2", ZoneId(1)).unwrap();

        assert_eq!(engine.allocate_park("V3", ZoneId(2)), Err(AllocationError::NoCapacity));
        assert!(engine.zones().iter().all(|z| z.available_slots() == 0));
        assert_counts_consistent(engine.zones());
    }

    #[test]
    fn test_duplicate_and_empty_vehicle_ids_accepted() {
        let mut zones = build_zones(&[&[3]], &[]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());

        let a = engine.allocate_park("DUP", ZoneId(1)).unwrap();
        let b = engine.allocate_park("DUP", ZoneId(1)).unwrap();
        let c = engine.allocate_park("", ZoneId(1)).unwrap();
        assert_ne!(a.slot_id, b.slot_id);

        let area = engine.zone(ZoneId(1)).and_then(|z| z.area(AreaId(1))).unwrap();
        assert_eq!(area.slot(c.slot_id).and_then(|s| s.vehicle_id()), Some(""));
        assert_eq!(area.available_slots(), 0);
    }

    #[test]
    fn test_allocate_then_release_round_trip() {
        let mut zones = build_zones(&[&[1, 2], &[1]], &[(1, 2)]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());
        engine.allocate_park("V0", ZoneId(1)).unwrap();

        let before_zone = engine.zone(ZoneId(1)).map(Zone::available_slots);
        let before_area = engine.zone(ZoneId(1)).and_then(|z| z.area(AreaId(2))).map(Area::available_slots);

        let p = engine.allocate_park("V1", ZoneId(1)).unwrap();
        assert_eq!((p.zone_id, p.area_id), (ZoneId(1), AreaId(2)));
        engine.release_park(p.zone_id, p.slot_id, p.area_id).unwrap();

        assert_eq!(engine.zone(ZoneId(1)).map(Zone::available_slots), before_zone);
        assert_eq!(
            engine.zone(ZoneId(1)).and_then(|z| z.area(AreaId(2))).map(Area::available_slots),
            before_area
        );
        assert_counts_consistent(engine.zones());
    }

    #[test]
    fn test_double_release_fails() {
        let mut zones = build_zones(&[&[2]], &[]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());
        let p = engine.allocate_park("V1", ZoneId(1)).unwrap();

        assert_eq!(engine.release_park(p.zone_id, p.slot_id, p.area_id), Ok(()));
        assert_eq!(
            engine.release_park(p.zone_id, p.slot_id, p.area_id),
            Err(AllocationError::SlotAlreadyFree { zone: p.zone_id, area: p.area_id, slot: p.slot_id })
        );
        assert_eq!(engine.zone(ZoneId(1)).map(Zone::available_slots), Some(2));
    }

    #[test]
    fn test_release_invalid_ids() {
        let mut zones = build_zones(&[&[2]], &[]);
        let mut engine = AllocationEngine::new(&mut zones, Penalties::default());
        engine.allocate_park("V1", ZoneId(1)).unwrap();

        assert_eq!(
            engine.release_park(ZoneId(0), SlotId(1), AreaId(1)),
            Err(AllocationError::InvalidZone(ZoneId(0)))
        );
        assert_eq!(
            engine.release_park(ZoneId(2), SlotId(1), AreaId(1)),
            Err(AllocationError::InvalidZone(ZoneId(2)))
        );
        assert!(matches!(
            engine.release_park(ZoneId(1), SlotId(1), AreaId(2)),
            Err(AllocationError::InvalidArea { .. })
        ));
        assert!(matches!(
            engine.release_park(ZoneId(1), SlotId(3), AreaId(1)),
            Err(AllocationError::InvalidSlot { .. })
        ));
        assert_eq!(engine.zone(ZoneId(1)).map(Zone::available_slots), Some(1));
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(AllocationMetrics::new());
        let mut zones = build_zones(&[&[1], &[1], &[1]], &[(1, 2)]);
        let mut engine =
            AllocationEngine::new(&mut zones, Penalties::default()).with_metrics(metrics.clone());

        let home = engine.allocate_park("V1", ZoneId(1)).unwrap();
        engine.allocate_park("V2", ZoneId(1)).unwrap();
        engine.allocate_park("V3", ZoneId(1)).unwrap();
        let _ = engine.allocate_park("V4", ZoneId(1));
        engine.release_park(home.zone_id, home.slot_id, home.area_id).unwrap();
        let _ = engine.release_park(home.zone_id, home.slot_id, home.area_id);

        assert_eq!(metrics.placements_for(Tier::Home), 1);
        assert_eq!(metrics.placements_for(Tier::Adjacent), 1);
        assert_eq!(metrics.placements_for(Tier::Global), 1);
        assert_eq!(metrics.rejected_total(), 1);
        assert_eq!(metrics.releases_total(), 1);
        assert_eq!(metrics.release_rejected_total(), 1);
        assert_eq!(metrics.penalty_total(), 40.0);
    }
}
