//! Allocation failures
//!
//! Every failure leaves the topology untouched.

use crate::domain::types::{AreaId, ReleaseFault, SlotId, ZoneId};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no zone has a free slot")]
    NoCapacity,

    #[error("zone {0} does not exist")]
    InvalidZone(ZoneId),

    #[error("zone {zone} has no area {area}")]
    InvalidArea { zone: ZoneId, area: AreaId },

    #[error("zone {zone} area {area} has no slot {slot}")]
    InvalidSlot { zone: ZoneId, area: AreaId, slot: SlotId },

    #[error("slot {slot} in zone {zone} area {area} is already free")]
    SlotAlreadyFree { zone: ZoneId, area: AreaId, slot: SlotId },
}

impl AllocationError {
    /// Attach release coordinates to a zone-level fault
    pub fn from_release(fault: ReleaseFault, zone: ZoneId, area: AreaId, slot: SlotId) -> Self {
        match fault {
            ReleaseFault::InvalidArea => AllocationError::InvalidArea { zone, area },
            ReleaseFault::InvalidSlot => AllocationError::InvalidSlot { zone, area, slot },
            ReleaseFault::AlreadyFree => AllocationError::SlotAlreadyFree { zone, area, slot },
        }
    }

    /// Short label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationError::NoCapacity => "no_capacity",
            AllocationError::InvalidZone(_) => "invalid_zone",
            AllocationError::InvalidArea { .. } => "invalid_area",
            AllocationError::InvalidSlot { .. } => "invalid_slot",
            AllocationError::SlotAlreadyFree { .. } => "slot_already_free",
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;
