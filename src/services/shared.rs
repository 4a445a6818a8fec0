//! Serialized access to a shared zone topology
//!
//! The whole three-tier search for one vehicle runs under a single lock, so two
//! callers can never race onto the same freed slot. Releases take the same lock.

use crate::domain::types::{AreaId, Penalties, Placement, SlotId, ZoneId};
use crate::domain::zone::Zone;
use crate::infra::metrics::AllocationMetrics;
use crate::io::report::StatusReport;
use crate::services::allocation::AllocationEngine;
use crate::services::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a topology guarded by one mutex
#[derive(Clone)]
pub struct SharedAllocator {
    zones: Arc<Mutex<Vec<Zone>>>,
    penalties: Penalties,
    metrics: Arc<AllocationMetrics>,
}

impl SharedAllocator {
    pub fn new(zones: Vec<Zone>, penalties: Penalties, metrics: Arc<AllocationMetrics>) -> Self {
        Self { zones: Arc::new(Mutex::new(zones)), penalties, metrics }
    }

    pub fn allocate_park(&self, vehicle_id: &str, requested_zone: ZoneId) -> Result<Placement> {
        let mut zones = self.zones.lock();
        self.engine(&mut zones).allocate_park(vehicle_id, requested_zone)
    }

    pub fn release_park(&self, zone_id: ZoneId, slot_id: SlotId, area_id: AreaId) -> Result<()> {
        let mut zones = self.zones.lock();
        self.engine(&mut zones).release_park(zone_id, slot_id, area_id)
    }

    /// Point-in-time status of every zone, area and occupied slot
    pub fn snapshot(&self) -> StatusReport {
        StatusReport::from_zones(&self.zones.lock())
    }

    /// Run a read-only query against the topology under the lock
    pub fn with_zones<R>(&self, f: impl FnOnce(&[Zone]) -> R) -> R {
        f(&self.zones.lock())
    }

    pub fn metrics(&self) -> &Arc<AllocationMetrics> {
        &self.metrics
    }

    pub fn penalties(&self) -> Penalties {
        self.penalties
    }

    fn engine<'a>(&self, zones: &'a mut [Zone]) -> AllocationEngine<'a> {
        AllocationEngine::new(zones, self.penalties).with_metrics(self.metrics.clone())
    }
}
