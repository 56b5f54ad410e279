//! Host collaborators consumed by GUID provisioning.
//!
//! Provisioning never touches the kernel directly. It goes through three
//! capabilities, each a trait so tests can substitute recording fakes:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Host collaborators                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  LinkManager                                                │
//! │  ├── link_list()        - Live links (name, hw addr, index) │
//! │  ├── set_vf_node_guid() - Write VF node GUID on a PF        │
//! │  └── set_vf_port_guid() - Write VF port GUID on a PF        │
//! │                                                             │
//! │  DeviceBinder                                               │
//! │  └── unbind()           - Detach a PCI device's driver      │
//! │                                                             │
//! │  PciResolver                                                │
//! │  └── pci_address()      - Interface name -> PCI address     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Linux implementations read sysfs and shell out to `ip(8)`.

mod kernel;
mod link;
mod pci;

pub use kernel::SysfsDeviceBinder;
pub use link::IpLinkManager;
pub use pci::{is_valid_pci_address, SysfsPciResolver};

use crate::error::Result;
use crate::guid::Guid;

/// A live network link as seen by the link layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Interface name (e.g., "ib216s0f0")
    pub name: String,
    /// Hardware address in its textual form
    pub hardware_addr: String,
    /// Kernel interface index
    pub index: u32,
}

/// Link-layer operations needed for VF GUID assignment.
pub trait LinkManager: Send + Sync {
    /// Snapshot of the live links on this host.
    fn link_list(&self) -> Result<Vec<Link>>;

    /// Set the node GUID of VF `vf_index` under `pf_link`.
    fn set_vf_node_guid(&self, pf_link: &Link, vf_index: u32, guid: Guid) -> Result<()>;

    /// Set the port GUID of VF `vf_index` under `pf_link`.
    fn set_vf_port_guid(&self, pf_link: &Link, vf_index: u32, guid: Guid) -> Result<()>;
}

/// Driver binding operations for PCI devices.
pub trait DeviceBinder: Send + Sync {
    /// Unbind whatever driver currently owns the device at `pci_address`.
    fn unbind(&self, pci_address: &str) -> Result<()>;
}

/// Maps a network interface to the PCI device backing it.
pub trait PciResolver: Send + Sync {
    /// PCI address of the device behind `interface`.
    ///
    /// Fails if the interface has no backing PCI device.
    fn pci_address(&self, interface: &str) -> Result<String>;
}
