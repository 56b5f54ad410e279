//! `ibguid show` and `ibguid lookup` commands

use super::HostOptions;
use anyhow::{Context, Result};
use ibguid_core::host::{IpLinkManager, SysfsPciResolver};
use ibguid_core::{AllocationSpec, GuidPool, IbGuidError};

/// Load the pool for this host, or `None` when no config file exists.
fn load_pool(host: &HostOptions) -> Result<Option<GuidPool>> {
    let path = host.config_path();
    let sysfs = host.sysfs_root();

    match GuidPool::from_config_file(
        &path,
        &IpLinkManager::with_root(&sysfs),
        &SysfsPciResolver::with_root(&sysfs),
    ) {
        Ok(pool) => Ok(Some(pool)),
        Err(e) if e.is_config_absent() => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

/// Print one row per configured PF.
pub fn show(host: &HostOptions) -> Result<()> {
    let Some(pool) = load_pool(host)? else {
        println!(
            "No ib guid config at {}; VFs get random GUIDs",
            host.config_path().display()
        );
        return Ok(());
    };

    if pool.is_empty() {
        println!("No PFs configured");
        return Ok(());
    }

    println!("{:<15} {:<6} {:<24} {:<24} {:>20}", "PCI ADDRESS", "MODE", "FIRST", "LAST", "CAPACITY");
    println!("{}", "-".repeat(93));

    for (pci_address, spec) in pool.iter() {
        let mode = match spec {
            AllocationSpec::List { .. } => "list",
            AllocationSpec::Range { .. } => "range",
        };
        let first = spec.first().map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());
        let last = spec.last().map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());

        println!(
            "{:<15} {:<6} {:<24} {:<24} {:>20}",
            pci_address,
            mode,
            first,
            last,
            spec.capacity()
        );
    }

    Ok(())
}

/// Print the GUID the pool assigns to one VF.
pub fn lookup(host: &HostOptions, pf: &str, vf_index: u32) -> Result<()> {
    let pool = load_pool(host)?.ok_or_else(|| IbGuidError::ConfigAbsent {
        path: host.config_path(),
    })?;

    let guid = pool.next_free_guid(pf, vf_index)?;
    println!("{}", guid);
    Ok(())
}
