//! IO modules - outward-facing views of the topology
//!
//! - `report` - Status snapshots, logging and JSONL egress

pub mod report;

// Re-export commonly used types
pub use report::{ReportEgress, StatusReport};
