//! CLI command implementations

pub mod configure;
pub mod parse;
pub mod show;

pub use configure::configure;
pub use parse::parse;
pub use show::{lookup, show};

use ibguid_core::host::{IpLinkManager, SysfsDeviceBinder, SysfsPciResolver};
use ibguid_core::{paths, Provisioner};
use std::path::PathBuf;

/// Host locations shared by all commands.
pub struct HostOptions {
    pub config: Option<PathBuf>,
    pub sysfs: Option<PathBuf>,
}

impl HostOptions {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(paths::guid_config_path)
    }

    pub fn sysfs_root(&self) -> PathBuf {
        self.sysfs.clone().unwrap_or_else(paths::sysfs_root)
    }

    /// Build a provisioner wired to this host.
    pub fn provisioner(&self) -> ibguid_core::Result<Provisioner> {
        if self.config.is_none() && self.sysfs.is_none() {
            return Provisioner::from_host();
        }

        let sysfs = self.sysfs_root();
        Provisioner::new(
            &self.config_path(),
            Box::new(IpLinkManager::with_root(&sysfs)),
            Box::new(SysfsDeviceBinder::with_root(&sysfs)),
            &SysfsPciResolver::with_root(&sysfs),
        )
    }
}
