//! `ibguid configure` command

use super::HostOptions;
use anyhow::{Context, Result};
use tracing::info;

/// Assign a GUID to a VF on this host and unbind its driver.
pub fn configure(host: &HostOptions, vf: &str, pf: &str, pf_link: &str, vf_index: u32) -> Result<()> {
    let provisioner = host.provisioner().context("failed to initialize provisioner")?;
    if !provisioner.has_pool() {
        info!("No ib guid config, assigning a random GUID");
    }

    let link = provisioner.find_link(pf_link)?;
    provisioner
        .configure_vf_guid(vf, pf, vf_index, &link)
        .with_context(|| format!("failed to configure GUID for VF {}", vf))?;

    println!("Configured VF {} (index {} on {})", vf, vf_index, pf_link);
    Ok(())
}
