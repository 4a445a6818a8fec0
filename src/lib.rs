//! Parking allocator library
//!
//! Assigns vehicles to slots across zones, preferring the requested zone,
//! then its declared neighbours, then any zone with room.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
