//! PCI driver unbinding through sysfs.

use super::DeviceBinder;
use crate::error::{IbGuidError, Result};
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Unbinds PCI devices by writing to `bus/pci/drivers/<driver>/unbind`.
#[derive(Debug, Clone)]
pub struct SysfsDeviceBinder {
    sysfs_root: PathBuf,
}

impl SysfsDeviceBinder {
    /// Binder rooted at the host's sysfs mount.
    pub fn new() -> Self {
        Self::with_root(paths::sysfs_root())
    }

    /// Binder rooted at an arbitrary sysfs tree.
    pub fn with_root(sysfs_root: impl Into<PathBuf>) -> Self {
        Self { sysfs_root: sysfs_root.into() }
    }

    /// Name of the driver currently bound to the device, if any.
    fn current_driver(&self, pci_address: &str) -> Option<String> {
        let driver_link = self.sysfs_root.join("bus/pci/devices").join(pci_address).join("driver");
        read_link_name(&driver_link)
    }
}

impl Default for SysfsDeviceBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBinder for SysfsDeviceBinder {
    fn unbind(&self, pci_address: &str) -> Result<()> {
        let Some(driver) = self.current_driver(pci_address) else {
            debug!(address = %pci_address, "Device has no driver bound, nothing to unbind");
            return Ok(());
        };

        let unbind_path = self.sysfs_root.join("bus/pci/drivers").join(&driver).join("unbind");

        debug!(address = %pci_address, driver = %driver, "Unbinding from driver");

        fs::write(&unbind_path, pci_address).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                return IbGuidError::UnbindFailed {
                    pci_address: pci_address.to_string(),
                    reason: format!("driver {} not found", driver),
                };
            }
            IbGuidError::IoError { path: unbind_path.clone(), source: e }
        })?;

        info!(address = %pci_address, driver = %driver, "Device unbound from driver");
        Ok(())
    }
}

fn read_link_name(link: &Path) -> Option<String> {
    fs::read_link(link)
        .ok()
        .and_then(|target| target.file_name().map(|n| n.to_string_lossy().to_string()))
}
