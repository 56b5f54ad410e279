//! Error types for ibguid.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use crate::guid::ParseGuidError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ibguid operations.
pub type Result<T> = std::result::Result<T, IbGuidError>;

/// Main error type for ibguid.
#[derive(Error, Debug)]
pub enum IbGuidError {
    // Config file errors
    #[error("ib guid config not found at {path:?}")]
    ConfigAbsent { path: PathBuf },

    #[error("failed to open ib guid config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode ib guid config from json: {source}")]
    ConfigDecode {
        #[source]
        source: serde_json::Error,
    },

    // PF identity errors
    #[error("either PCI address or PF GUID required to describe an interface, both provided")]
    PfIdentityConflict,

    #[error("either PCI address or PF GUID required to describe an interface, none provided")]
    PfIdentityMissing,

    #[error("no matching link found for pf guid: {pf_guid}")]
    PfLinkNotFound { pf_guid: String },

    #[error("failed to resolve pci address of interface {interface}: {reason}")]
    PciResolution { interface: String, reason: String },

    #[error("failed to list network links: {reason}")]
    LinkList { reason: String },

    #[error("link {name} not found")]
    LinkNotFound { name: String },

    // Allocation mode errors
    #[error("either guid list or guid range should be provided, got both")]
    AllocationConflict,

    #[error("both guid rangeStart and rangeEnd should be provided, got one")]
    IncompleteRange,

    #[error("either guid list or guid range should be provided, got none")]
    AllocationMissing,

    #[error("failed to parse ib guid {value}: {source}")]
    InvalidGuid {
        value: String,
        #[source]
        source: ParseGuidError,
    },

    #[error("failed to parse ib guid range {bound}: {source}")]
    InvalidRangeBound {
        bound: &'static str,
        #[source]
        source: ParseGuidError,
    },

    #[error("range end cannot be less than or equal to range start")]
    InvalidRange { start: String, end: String },

    // Pool lookup errors
    #[error("no guid pool for pci address: {pci_address}")]
    NoGuidPool { pci_address: String },

    #[error("guid pool exhausted for pci address: {pci_address}")]
    GuidPoolExhausted { pci_address: String },

    // Hardware apply errors
    #[error("failed to set vf {vf_index} {attribute} on {link}: {reason}")]
    LinkSetFailed { link: String, vf_index: u32, attribute: &'static str, reason: String },

    #[error("failed to unbind driver from {pci_address}: {reason}")]
    UnbindFailed { pci_address: String, reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IbGuidError {
    /// Whether this error only means that no GUID config file was provided.
    ///
    /// The provisioner treats this as "random GUID mode", never as a failure.
    pub fn is_config_absent(&self) -> bool {
        matches!(self, Self::ConfigAbsent { .. })
    }
}
