//! Infrastructure - configuration and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Topology and policy configuration (TOML loading, defaults)
//! - `metrics` - Lock-free allocation metrics

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::Config;
pub use metrics::{AllocationMetrics, MetricsSummary};
