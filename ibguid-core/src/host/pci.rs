//! Interface to PCI address resolution through sysfs.

use super::PciResolver;
use crate::error::{IbGuidError, Result};
use crate::paths;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Regular expression to validate PCI address format: 0000:3b:00.0
static PCI_ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{4}:[0-9a-fA-F]{2}:[0-9a-fA-F]{2}\.[0-7]$")
        .expect("Invalid PCI address regex")
});

/// Validate PCI address format.
pub fn is_valid_pci_address(address: &str) -> bool {
    PCI_ADDRESS_REGEX.is_match(address)
}

/// Resolves interfaces via the `class/net/<iface>/device` symlink.
#[derive(Debug, Clone)]
pub struct SysfsPciResolver {
    sysfs_root: PathBuf,
}

impl SysfsPciResolver {
    /// Resolver rooted at the host's sysfs mount.
    pub fn new() -> Self {
        Self::with_root(paths::sysfs_root())
    }

    /// Resolver rooted at an arbitrary sysfs tree.
    pub fn with_root(sysfs_root: impl Into<PathBuf>) -> Self {
        Self { sysfs_root: sysfs_root.into() }
    }
}

impl Default for SysfsPciResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PciResolver for SysfsPciResolver {
    fn pci_address(&self, interface: &str) -> Result<String> {
        let device_link = self.sysfs_root.join("class/net").join(interface).join("device");

        let target = fs::read_link(&device_link).map_err(|e| IbGuidError::PciResolution {
            interface: interface.to_string(),
            reason: format!("{}: {}", device_link.display(), e),
        })?;

        let address = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !is_valid_pci_address(&address) {
            return Err(IbGuidError::PciResolution {
                interface: interface.to_string(),
                reason: format!("{} is not backed by a PCI device", target.display()),
            });
        }

        debug!(interface = %interface, pci_address = %address, "Resolved interface PCI address");
        Ok(address)
    }
}
