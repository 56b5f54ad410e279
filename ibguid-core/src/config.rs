//! GUID config loading.
//!
//! The config file is a JSON array; each element assigns GUIDs to the VFs of
//! one PF, either as an explicit list or as an inclusive range:
//!
//! ```json
//! [
//!   {"pciAddress": "0000:3b:00.0", "guids": ["00:00:00:00:00:00:00:00", "00:00:00:00:00:00:00:01"]},
//!   {"pfGuid": "00:01:02:03:04:05:06:07", "rangeStart": "00:00:00:00:00:00:01:00", "rangeEnd": "00:00:00:00:00:00:01:ff"}
//! ]
//! ```
//!
//! Loading is all-or-nothing: the first invalid record fails the whole load.

use crate::error::{IbGuidError, Result};
use crate::guid::Guid;
use crate::host::{Link, PciResolver};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// One record of the GUID config file, as written on disk.
///
/// Empty strings and empty arrays are treated the same as absent fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGuidConfig {
    #[serde(default)]
    pub pci_address: Option<String>,
    #[serde(default)]
    pub pf_guid: Option<String>,
    #[serde(default)]
    pub guids: Option<Vec<String>>,
    #[serde(default)]
    pub range_start: Option<String>,
    #[serde(default)]
    pub range_end: Option<String>,
}

impl RawGuidConfig {
    fn pci_address(&self) -> Option<&str> {
        non_empty(&self.pci_address)
    }

    fn pf_guid(&self) -> Option<&str> {
        non_empty(&self.pf_guid)
    }

    fn guids(&self) -> &[String] {
        self.guids.as_deref().unwrap_or_default()
    }

    fn range_start(&self) -> Option<&str> {
        non_empty(&self.range_start)
    }

    fn range_end(&self) -> Option<&str> {
        non_empty(&self.range_end)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// How GUIDs are assigned to the VFs of one PF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationSpec {
    /// VF `i` gets `guids[i]`.
    List { guids: Vec<Guid> },
    /// VF `i` gets `start + i`, up to and including `end`. Always `end > start`.
    Range { start: Guid, end: Guid },
}

impl AllocationSpec {
    /// Number of VFs this spec can serve.
    pub fn capacity(&self) -> u64 {
        match self {
            Self::List { guids } => guids.len() as u64,
            // end > start, so this cannot underflow; a full 2^64 span saturates
            Self::Range { start, end } => (end.as_u64() - start.as_u64()).saturating_add(1),
        }
    }

    /// First GUID handed out (VF index 0).
    pub fn first(&self) -> Option<Guid> {
        match self {
            Self::List { guids } => guids.first().copied(),
            Self::Range { start, .. } => Some(*start),
        }
    }

    /// Last GUID that can be handed out.
    pub fn last(&self) -> Option<Guid> {
        match self {
            Self::List { guids } => guids.last().copied(),
            Self::Range { end, .. } => Some(*end),
        }
    }
}

/// Validated GUID assignments keyed by PF PCI address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidConfigTable {
    entries: HashMap<String, AllocationSpec>,
}

impl GuidConfigTable {
    /// Allocation spec for a PF, if configured.
    pub fn get(&self, pci_address: &str) -> Option<&AllocationSpec> {
        self.entries.get(pci_address)
    }

    /// Number of configured PFs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by PCI address.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AllocationSpec)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// Insert an entry. A later record for the same PF replaces the earlier one.
    fn insert(&mut self, pci_address: String, spec: AllocationSpec) {
        if self.entries.insert(pci_address.clone(), spec).is_some() {
            warn!(
                pci_address = %pci_address,
                "Duplicate ib guid config for PF, later record replaces earlier one"
            );
        }
    }
}

impl FromIterator<(String, AllocationSpec)> for GuidConfigTable {
    fn from_iter<I: IntoIterator<Item = (String, AllocationSpec)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (pci_address, spec) in iter {
            table.insert(pci_address, spec);
        }
        table
    }
}

/// Read and decode the config file without validating it.
///
/// A missing file is reported as [`IbGuidError::ConfigAbsent`] so callers can
/// treat it as "no config provided".
pub fn read_raw_config(path: &Path) -> Result<Vec<RawGuidConfig>> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IbGuidError::ConfigAbsent { path: path.to_path_buf() }
        } else {
            IbGuidError::ConfigRead { path: path.to_path_buf(), source: e }
        }
    })?;

    serde_json::from_str(&content).map_err(|e| IbGuidError::ConfigDecode { source: e })
}

/// Read, validate, and index the config file.
///
/// `links` is a snapshot of the live links, used to resolve `pfGuid` records.
#[instrument(skip(links, resolver), fields(path = %path.display()))]
pub fn load_guid_config(
    path: &Path,
    links: &[Link],
    resolver: &dyn PciResolver,
) -> Result<GuidConfigTable> {
    let raw = read_raw_config(path)?;
    let table = build_table(&raw, links, resolver)?;
    info!(entries = table.len(), "Loaded ib guid config");
    Ok(table)
}

/// Validate raw records into a table. The first invalid record fails the build.
pub fn build_table(
    raw: &[RawGuidConfig],
    links: &[Link],
    resolver: &dyn PciResolver,
) -> Result<GuidConfigTable> {
    let mut table = GuidConfigTable::default();

    for (position, record) in raw.iter().enumerate() {
        let pci_address = resolve_pf_pci_address(record, links, resolver).map_err(|e| {
            warn!(record = position, error = %e, "Failed to extract pci address from ib guid config");
            e
        })?;
        let spec = parse_allocation(record)?;

        debug!(record = position, pci_address = %pci_address, capacity = spec.capacity(), "Parsed ib guid config record");
        table.insert(pci_address, spec);
    }

    Ok(table)
}

/// Determine the PCI address of the PF a record describes.
pub fn resolve_pf_pci_address(
    record: &RawGuidConfig,
    links: &[Link],
    resolver: &dyn PciResolver,
) -> Result<String> {
    match (record.pci_address(), record.pf_guid()) {
        (Some(_), Some(_)) => Err(IbGuidError::PfIdentityConflict),
        (Some(pci_address), None) => Ok(pci_address.to_string()),
        (None, Some(pf_guid)) => {
            let link = links
                .iter()
                .find(|link| link.hardware_addr == pf_guid)
                .ok_or_else(|| IbGuidError::PfLinkNotFound { pf_guid: pf_guid.to_string() })?;
            resolver.pci_address(&link.name)
        }
        (None, None) => Err(IbGuidError::PfIdentityMissing),
    }
}

/// Choose and parse the allocation mode of a record.
pub fn parse_allocation(record: &RawGuidConfig) -> Result<AllocationSpec> {
    let guids = record.guids();

    match (guids.is_empty(), record.range_start(), record.range_end()) {
        (false, Some(_), _) | (false, _, Some(_)) => Err(IbGuidError::AllocationConflict),
        (_, Some(_), None) | (_, None, Some(_)) => Err(IbGuidError::IncompleteRange),
        (false, None, None) => {
            let guids = guids
                .iter()
                .map(|value| {
                    value
                        .parse::<Guid>()
                        .map_err(|source| IbGuidError::InvalidGuid { value: value.clone(), source })
                })
                .collect::<Result<Vec<Guid>>>()?;
            Ok(AllocationSpec::List { guids })
        }
        (true, Some(start), Some(end)) => {
            let start: Guid = start
                .parse()
                .map_err(|source| IbGuidError::InvalidRangeBound { bound: "start", source })?;
            let end: Guid = end
                .parse()
                .map_err(|source| IbGuidError::InvalidRangeBound { bound: "end", source })?;

            if end <= start {
                return Err(IbGuidError::InvalidRange {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
            Ok(AllocationSpec::Range { start, end })
        }
        (true, None, None) => Err(IbGuidError::AllocationMissing),
    }
}
