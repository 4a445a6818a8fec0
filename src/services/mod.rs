//! Services - allocation decisions and serialized access
//!
//! This module contains the business logic:
//! - `allocation` - Three-tier placement engine (home / adjacent / global)
//! - `shared` - Mutex-guarded topology handle for concurrent callers
//! - `error` - Allocation and release failures

pub mod allocation;
pub mod error;
pub mod shared;

// Re-export commonly used types
pub use allocation::AllocationEngine;
pub use error::AllocationError;
pub use shared::SharedAllocator;
