//! Link enumeration through sysfs and VF GUID writes through `ip link`.

use super::{Link, LinkManager};
use crate::error::{IbGuidError, Result};
use crate::guid::Guid;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, instrument};

/// VF GUID attributes understood by `ip link set ... vf N`.
const NODE_GUID: &str = "node_guid";
const PORT_GUID: &str = "port_guid";

/// Linux link manager: enumerates `class/net` and writes GUIDs with iproute2.
#[derive(Debug, Clone)]
pub struct IpLinkManager {
    sysfs_root: PathBuf,
}

impl IpLinkManager {
    /// Link manager rooted at the host's sysfs mount.
    pub fn new() -> Self {
        Self::with_root(paths::sysfs_root())
    }

    /// Link manager that enumerates links from an arbitrary sysfs tree.
    pub fn with_root(sysfs_root: impl Into<PathBuf>) -> Self {
        Self { sysfs_root: sysfs_root.into() }
    }

    /// Execute an ip command and check for errors.
    fn exec_ip(&self, args: &[String]) -> std::result::Result<String, String> {
        let output = Command::new("ip")
            .args(args)
            .output()
            .map_err(|e| format!("Failed to execute ip command: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ip command failed: {}", stderr.trim());
            return Err(stderr.trim().to_string());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn set_vf_guid(
        &self,
        pf_link: &Link,
        vf_index: u32,
        attribute: &'static str,
        guid: Guid,
    ) -> Result<()> {
        let args = vf_guid_args(&pf_link.name, vf_index, attribute, guid);
        self.exec_ip(&args).map_err(|reason| IbGuidError::LinkSetFailed {
            link: pf_link.name.clone(),
            vf_index,
            attribute,
            reason,
        })?;

        info!(pf = %pf_link.name, vf = vf_index, %guid, "Set VF {}", attribute);
        Ok(())
    }
}

impl Default for IpLinkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkManager for IpLinkManager {
    #[instrument(skip(self))]
    fn link_list(&self) -> Result<Vec<Link>> {
        let net_dir = self.sysfs_root.join("class/net");
        let entries = fs::read_dir(&net_dir).map_err(|e| IbGuidError::LinkList {
            reason: format!("{}: {}", net_dir.display(), e),
        })?;

        let mut links = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(dir = %net_dir.display(), error = %e, "Skipping unreadable link entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();

            // Interfaces without a readable address (e.g. mid-teardown) are skipped
            let Some(hardware_addr) = read_attr(&path.join("address")) else {
                debug!(interface = %name, "Skipping link without hardware address");
                continue;
            };
            let index = match read_attr(&path.join("ifindex")).map(|s| s.parse::<u32>()) {
                Some(Ok(index)) => index,
                Some(Err(e)) => {
                    debug!(interface = %name, error = %e, "Unparsable ifindex, using 0");
                    0
                }
                None => {
                    debug!(interface = %name, "Link has no ifindex, using 0");
                    0
                }
            };

            links.push(Link { name, hardware_addr, index });
        }

        links.sort_by_key(|l| l.index);
        debug!(count = links.len(), "Listed network links");
        Ok(links)
    }

    fn set_vf_node_guid(&self, pf_link: &Link, vf_index: u32, guid: Guid) -> Result<()> {
        self.set_vf_guid(pf_link, vf_index, NODE_GUID, guid)
    }

    fn set_vf_port_guid(&self, pf_link: &Link, vf_index: u32, guid: Guid) -> Result<()> {
        self.set_vf_guid(pf_link, vf_index, PORT_GUID, guid)
    }
}

/// Arguments for `ip link set dev <pf> vf <n> <attribute> <guid>`.
fn vf_guid_args(pf: &str, vf_index: u32, attribute: &str, guid: Guid) -> Vec<String> {
    vec![
        "link".to_string(),
        "set".to_string(),
        "dev".to_string(),
        pf.to_string(),
        "vf".to_string(),
        vf_index.to_string(),
        attribute.to_string(),
        guid.to_string(),
    ]
}

fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
