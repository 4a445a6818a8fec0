//! Domain models - parking topology and allocation types
//!
//! This module contains the entities the allocator mutates:
//! - `Slot` - a single parking space and its occupant
//! - `Area` - fixed run of slots inside a zone
//! - `Zone` - ordered areas plus directed adjacency
//! - `types` - identifiers, tiers, penalties and placements

pub mod area;
pub mod slot;
pub mod types;
pub mod zone;

// Re-export commonly used types at module level
pub use area::Area;
pub use slot::Slot;
pub use types::{AreaId, Penalties, Placement, ReleaseFault, SlotId, Tier, Vehicle, ZoneId};
pub use zone::Zone;
