//! ibguid core library
//!
//! Deterministic GUID assignment for SR-IOV virtual functions on InfiniBand
//! physical functions: load the per-host GUID config, answer per-VF lookups,
//! and write the chosen GUID to the hardware.

pub mod config;
pub mod error;
pub mod guid;
pub mod host;
pub mod observability;
pub mod paths;
pub mod pool;
pub mod provisioner;

// Re-export commonly used items
pub use config::{AllocationSpec, GuidConfigTable, RawGuidConfig};
pub use error::{IbGuidError, Result};
pub use guid::{Guid, ParseGuidError};
pub use host::{DeviceBinder, Link, LinkManager, PciResolver};
pub use observability::init as init_observability;
pub use pool::GuidPool;
pub use provisioner::{GuidSource, Provisioner};
