//! VF GUID provisioning.
//!
//! The provisioner picks a GUID for a VF (from the pool when one is
//! configured, otherwise at random), writes it as both node and port GUID,
//! and unbinds the VF driver so the new GUIDs take effect on rebind.

use crate::error::{IbGuidError, Result};
use crate::guid::Guid;
use crate::host::{
    DeviceBinder, IpLinkManager, Link, LinkManager, PciResolver, SysfsDeviceBinder,
    SysfsPciResolver,
};
use crate::observability::metrics as ib_metrics;
use crate::paths;
use crate::pool::GuidPool;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Where the GUID written to a VF came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidSource {
    Pool,
    Random,
}

impl GuidSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Random => "random",
        }
    }
}

/// Assigns GUIDs to InfiniBand VFs.
///
/// Built once at startup. Without a pool (no config file on the host) every
/// VF gets a random GUID.
pub struct Provisioner {
    pool: Option<GuidPool>,
    link_manager: Box<dyn LinkManager>,
    device_binder: Box<dyn DeviceBinder>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner").field("pool", &self.pool).finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Create a provisioner, loading the GUID pool from `config_path`.
    ///
    /// A missing config file is not an error: the provisioner falls back to
    /// random GUIDs. Any other load failure is returned.
    #[instrument(skip_all, fields(config_path = %config_path.display()))]
    pub fn new(
        config_path: &Path,
        link_manager: Box<dyn LinkManager>,
        device_binder: Box<dyn DeviceBinder>,
        pci_resolver: &dyn PciResolver,
    ) -> Result<Self> {
        let pool = match GuidPool::from_config_file(config_path, link_manager.as_ref(), pci_resolver)
        {
            Ok(pool) => Some(pool),
            Err(e) if e.is_config_absent() => {
                info!(
                    config_path = %config_path.display(),
                    "ib guid config doesn't exist, continuing without it"
                );
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self::with_pool(pool, link_manager, device_binder))
    }

    /// Create a provisioner from an already loaded pool (or none).
    pub fn with_pool(
        pool: Option<GuidPool>,
        link_manager: Box<dyn LinkManager>,
        device_binder: Box<dyn DeviceBinder>,
    ) -> Self {
        Self { pool, link_manager, device_binder }
    }

    /// Create a provisioner against this host: config from the standard
    /// host path, links and drivers through sysfs and `ip(8)`.
    pub fn from_host() -> Result<Self> {
        Self::new(
            &paths::guid_config_path(),
            Box::new(IpLinkManager::new()),
            Box::new(SysfsDeviceBinder::new()),
            &SysfsPciResolver::new(),
        )
    }

    /// Whether a GUID pool is configured.
    pub fn has_pool(&self) -> bool {
        self.pool.is_some()
    }

    pub fn pool(&self) -> Option<&GuidPool> {
        self.pool.as_ref()
    }

    /// Pick the GUID for VF `vf_index` of the PF at `pf_address`.
    ///
    /// Pool lookup failures are logged and replaced by a random GUID; they
    /// are never returned.
    pub fn choose_guid(
        &self,
        vf_address: &str,
        pf_address: &str,
        vf_index: u32,
    ) -> (Guid, GuidSource) {
        let candidate = Guid::random();

        let Some(pool) = &self.pool else {
            return (candidate, GuidSource::Random);
        };

        match pool.next_free_guid(pf_address, vf_index) {
            Ok(guid) => (guid, GuidSource::Pool),
            Err(e) => {
                let reason = fallback_reason(&e);
                warn!(
                    address = %vf_address,
                    pf = %pf_address,
                    vf = vf_index,
                    reason = %reason,
                    error = %e,
                    "Failed to get GUID from ib guid pool, falling back to random GUID"
                );
                ib_metrics::record_pool_fallback(reason);
                (candidate, GuidSource::Random)
            }
        }
    }

    /// Assign a GUID to a VF and unbind its driver.
    ///
    /// Writes the node GUID, then the port GUID, then unbinds the VF at
    /// `vf_address`. The first failing step aborts the call and its error is
    /// returned unchanged.
    #[instrument(skip(self, pf_link), fields(pf_link = %pf_link.name))]
    pub fn configure_vf_guid(
        &self,
        vf_address: &str,
        pf_address: &str,
        vf_index: u32,
        pf_link: &Link,
    ) -> Result<()> {
        let (guid, source) = self.choose_guid(vf_address, pf_address, vf_index);
        self.apply_vf_guid(guid, vf_address, vf_index, pf_link)?;

        ib_metrics::record_guid_assigned(source.as_str());
        info!(address = %vf_address, vf = vf_index, %guid, source = %source.as_str(), "Configured VF GUID");
        Ok(())
    }

    fn apply_vf_guid(
        &self,
        guid: Guid,
        vf_address: &str,
        vf_index: u32,
        pf_link: &Link,
    ) -> Result<()> {
        self.link_manager.set_vf_node_guid(pf_link, vf_index, guid)?;
        self.link_manager.set_vf_port_guid(pf_link, vf_index, guid)?;
        self.device_binder.unbind(vf_address)
    }

    /// Find a live link by interface name.
    pub fn find_link(&self, name: &str) -> Result<Link> {
        self.link_manager
            .link_list()?
            .into_iter()
            .find(|link| link.name == name)
            .ok_or_else(|| IbGuidError::LinkNotFound { name: name.to_string() })
    }
}

/// Metric label for a pool lookup failure.
fn fallback_reason(err: &IbGuidError) -> &'static str {
    match err {
        IbGuidError::NoGuidPool { .. } => "not_found",
        IbGuidError::GuidPoolExhausted { .. } => "exhausted",
        _ => "error",
    }
}
