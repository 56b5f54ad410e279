//! GUID pool: per-PF GUID lookups by VF index.
//!
//! The pool is not a consuming allocator. A lookup is a pure function of
//! `(pf, vf_index)`, so retrying the same VF always yields the same GUID.

use crate::config::{self, AllocationSpec, GuidConfigTable};
use crate::error::{IbGuidError, Result};
use crate::guid::Guid;
use crate::host::{LinkManager, PciResolver};
use std::path::Path;
use tracing::{debug, instrument};

/// Read-only GUID assignments for the PFs of this host.
#[derive(Debug, Clone, Default)]
pub struct GuidPool {
    table: GuidConfigTable,
}

impl GuidPool {
    /// Create a pool over an already validated table.
    pub fn new(table: GuidConfigTable) -> Self {
        metrics::gauge!("ibguid_config_entries").set(table.len() as f64);
        Self { table }
    }

    /// Load the pool from a config file.
    ///
    /// The file is read before the link layer is queried, so a missing config
    /// surfaces as [`IbGuidError::ConfigAbsent`] without touching any link.
    #[instrument(skip(link_manager, resolver), fields(path = %path.display()))]
    pub fn from_config_file(
        path: &Path,
        link_manager: &dyn LinkManager,
        resolver: &dyn PciResolver,
    ) -> Result<Self> {
        let raw = config::read_raw_config(path)?;
        let links = link_manager.link_list()?;
        let table = config::build_table(&raw, &links, resolver)?;
        debug!(entries = table.len(), "Created ib guid pool");
        Ok(Self::new(table))
    }

    /// GUID assigned to VF `vf_index` of the PF at `pf_pci_address`.
    ///
    /// # Errors
    ///
    /// - [`IbGuidError::NoGuidPool`] if the PF has no config entry
    /// - [`IbGuidError::GuidPoolExhausted`] if `vf_index` is past the end of
    ///   the list or range
    pub fn next_free_guid(&self, pf_pci_address: &str, vf_index: u32) -> Result<Guid> {
        let spec = self
            .table
            .get(pf_pci_address)
            .ok_or_else(|| IbGuidError::NoGuidPool { pci_address: pf_pci_address.to_string() })?;

        let exhausted =
            || IbGuidError::GuidPoolExhausted { pci_address: pf_pci_address.to_string() };

        match spec {
            AllocationSpec::List { guids } => {
                guids.get(vf_index as usize).copied().ok_or_else(exhausted)
            }
            AllocationSpec::Range { start, end } => {
                // Compare in u128 so a range ending near 2^64 cannot wrap back into itself
                let next = u128::from(start.as_u64()) + u128::from(vf_index);
                if next > u128::from(end.as_u64()) {
                    return Err(exhausted());
                }
                Ok(*start + vf_index)
            }
        }
    }

    /// Allocation spec for a PF, if configured.
    pub fn get(&self, pf_pci_address: &str) -> Option<&AllocationSpec> {
        self.table.get(pf_pci_address)
    }

    /// Configured PFs ordered by PCI address.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AllocationSpec)> {
        self.table.iter()
    }

    /// The underlying config table.
    pub fn table(&self) -> &GuidConfigTable {
        &self.table
    }

    /// Number of PFs with a config entry.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl From<GuidConfigTable> for GuidPool {
    fn from(table: GuidConfigTable) -> Self {
        Self::new(table)
    }
}
