//! Status reporting - read-only snapshots of the topology
//!
//! Snapshots are built from the zone accessors only and are never fed back
//! into allocation decisions. They can be logged or appended to a file in
//! JSONL format (one JSON object per line).

use crate::domain::types::{AreaId, SlotId, ZoneId};
use crate::domain::zone::Zone;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub slot_id: SlotId,
    pub vehicle_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaStatus {
    pub area_id: AreaId,
    pub total_slots: u32,
    pub available_slots: u32,
    /// Occupied slots only, in slot order
    pub occupied: Vec<SlotStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneStatus {
    pub zone_id: ZoneId,
    pub name: String,
    pub total_slots: u32,
    pub available_slots: u32,
    pub utilization: f64,
    pub adjacent: Vec<ZoneId>,
    pub areas: Vec<AreaStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub zones: Vec<ZoneStatus>,
}

impl StatusReport {
    pub fn from_zones(zones: &[Zone]) -> Self {
        let zones = zones
            .iter()
            .map(|zone| ZoneStatus {
                zone_id: zone.zone_id(),
                name: zone.name().to_string(),
                total_slots: zone.total_slots(),
                available_slots: zone.available_slots(),
                utilization: zone.utilization(),
                adjacent: zone.adjacent_zones().to_vec(),
                areas: zone
                    .areas()
                    .iter()
                    .map(|area| AreaStatus {
                        area_id: area.area_id(),
                        total_slots: area.total_slots(),
                        available_slots: area.available_slots(),
                        occupied: area
                            .slots()
                            .iter()
                            .filter_map(|slot| {
                                slot.vehicle_id().map(|vid| SlotStatus {
                                    slot_id: slot.slot_id(),
                                    vehicle_id: vid.to_string(),
                                })
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { zones }
    }

    pub fn total_slots(&self) -> u32 {
        self.zones.iter().map(|z| z.total_slots).sum()
    }

    pub fn available_slots(&self) -> u32 {
        self.zones.iter().map(|z| z.available_slots).sum()
    }

    /// Emit one `zone_status` event per zone and one `area_status` per area
    pub fn log(&self) {
        for zone in &self.zones {
            info!(
                zone_id = %zone.zone_id,
                name = %zone.name,
                total = %zone.total_slots,
                available = %zone.available_slots,
                utilization = format!("{:.1}", zone.utilization),
                adjacent = ?zone.adjacent.iter().map(|z| z.0).collect::<Vec<_>>(),
                "zone_status"
            );
            for area in &zone.areas {
                info!(
                    zone_id = %zone.zone_id,
                    area_id = %area.area_id,
                    total = %area.total_slots,
                    available = %area.available_slots,
                    "area_status"
                );
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Appends status snapshots to a JSONL file
pub struct ReportEgress {
    file_path: String,
}

impl ReportEgress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "report_egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Append one snapshot; returns true if it was written
    pub fn write(&self, report: &StatusReport) -> bool {
        match self.append_line(&report.to_json()) {
            Ok(()) => {
                info!(zones = %report.zones.len(), "status_egressed");
                true
            }
            Err(e) => {
                error!(file = %self.file_path, error = %e, "status_egress_failed");
                false
            }
        }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }
}
