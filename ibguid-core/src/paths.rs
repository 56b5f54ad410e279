//! Centralized path configuration for ibguid.
//!
//! The GUID config lives at a fixed location on the host. When running inside
//! a container the host filesystem is expected under `/host`.

use std::path::{Path, PathBuf};

/// Location of the GUID config relative to the host root.
pub const GUID_CONFIG_FILE: &str = "etc/sriov-operator/infiniband/guids";

/// Mount point of the host filesystem inside a container.
pub const CONTAINER_HOST_ROOT: &str = "/host";

/// Get the host root directory.
///
/// Resolution order:
/// 1. `IBGUID_HOST_ROOT` environment variable
/// 2. `/host` if it exists (containerized, host mounted)
/// 3. `/`
pub fn host_root() -> PathBuf {
    resolve_host_root(std::env::var("IBGUID_HOST_ROOT").ok(), Path::new(CONTAINER_HOST_ROOT))
}

/// Get the GUID config path.
///
/// `IBGUID_CONFIG_PATH` overrides the whole path; otherwise the file is
/// looked up under [`host_root`].
pub fn guid_config_path() -> PathBuf {
    resolve_config_path(std::env::var("IBGUID_CONFIG_PATH").ok(), &host_root())
}

/// Get the sysfs mount point (`IBGUID_SYSFS_ROOT` or `/sys`).
pub fn sysfs_root() -> PathBuf {
    std::env::var("IBGUID_SYSFS_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("/sys"))
}

fn resolve_host_root(env_root: Option<String>, container_root: &Path) -> PathBuf {
    if let Some(dir) = env_root {
        return PathBuf::from(dir);
    }

    if container_root.is_dir() {
        return container_root.to_path_buf();
    }

    PathBuf::from("/")
}

fn resolve_config_path(env_path: Option<String>, host_root: &Path) -> PathBuf {
    match env_path {
        Some(path) => PathBuf::from(path),
        None => host_path(host_root, GUID_CONFIG_FILE),
    }
}

/// Join a host-absolute path onto a host root.
fn host_path(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}
