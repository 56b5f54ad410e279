//! Integration tests for VF GUID provisioning.
//!
//! These tests drive the public API end to end:
//! - Load a GUID config from disk
//! - Look up GUIDs per PF and VF index
//! - Configure VFs through the provisioner
//!
//! Link enumeration, PCI resolution, and driver unbinding run against a fake
//! sysfs tree in a temp directory. Only the `ip link` GUID writes are mocked.

use ibguid_core::{
    error::{IbGuidError, Result},
    host::{IpLinkManager, SysfsDeviceBinder, SysfsPciResolver},
    Guid, GuidPool, Link, LinkManager, Provisioner,
};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const TABLE_CONFIG: &str = r#"[
    {"pciAddress":"0000:3b:00.0","guids":["00:00:00:00:00:00:00:00","00:00:00:00:00:00:00:01"]},
    {"pciAddress":"0000:3b:00.1","rangeStart":"00:00:00:00:00:00:01:00","rangeEnd":"00:00:00:00:00:00:01:02"}
]"#;

/// Recorded GUID write: (attribute, pf, vf index, guid).
type GuidWrite = (&'static str, String, u32, Guid);

/// Link manager that lists links from a sysfs tree and records GUID writes.
struct RecordingLinks {
    sysfs: IpLinkManager,
    writes: Arc<Mutex<Vec<GuidWrite>>>,
}

impl RecordingLinks {
    fn new(root: &Path) -> (Self, Arc<Mutex<Vec<GuidWrite>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        (Self { sysfs: IpLinkManager::with_root(root), writes: writes.clone() }, writes)
    }
}

impl LinkManager for RecordingLinks {
    fn link_list(&self) -> Result<Vec<Link>> {
        self.sysfs.link_list()
    }

    fn set_vf_node_guid(&self, pf_link: &Link, vf_index: u32, guid: Guid) -> Result<()> {
        self.writes.lock().unwrap().push(("node_guid", pf_link.name.clone(), vf_index, guid));
        Ok(())
    }

    fn set_vf_port_guid(&self, pf_link: &Link, vf_index: u32, guid: Guid) -> Result<()> {
        self.writes.lock().unwrap().push(("port_guid", pf_link.name.clone(), vf_index, guid));
        Ok(())
    }
}

/// Fake host: a sysfs tree with one IB PF and a config file location.
struct FakeHost {
    dir: TempDir,
}

impl FakeHost {
    fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    fn sysfs(&self) -> PathBuf {
        self.dir.path().join("sys")
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("guids")
    }

    fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_path();
        fs::write(&path, content).unwrap();
        path
    }

    /// Add a PF netdev backed by a PCI device.
    fn add_pf(&self, iface: &str, hw_addr: &str, ifindex: u32, pci_address: &str) {
        let sys = self.sysfs();
        let device = sys.join("bus/pci/devices").join(pci_address);
        fs::create_dir_all(&device).unwrap();

        let net = sys.join("class/net").join(iface);
        fs::create_dir_all(&net).unwrap();
        fs::write(net.join("address"), format!("{}\n", hw_addr)).unwrap();
        fs::write(net.join("ifindex"), format!("{}\n", ifindex)).unwrap();
        symlink(&device, net.join("device")).unwrap();
    }

    /// Add a VF PCI device bound to `driver`; returns the driver's unbind file.
    fn add_vf(&self, pci_address: &str, driver: &str) -> PathBuf {
        let sys = self.sysfs();
        let driver_dir = sys.join("bus/pci/drivers").join(driver);
        fs::create_dir_all(&driver_dir).unwrap();
        fs::write(driver_dir.join("unbind"), "").unwrap();

        let device = sys.join("bus/pci/devices").join(pci_address);
        fs::create_dir_all(&device).unwrap();
        symlink(&driver_dir, device.join("driver")).unwrap();
        driver_dir.join("unbind")
    }

    fn provisioner(&self) -> Result<(Provisioner, Arc<Mutex<Vec<GuidWrite>>>)> {
        let (links, writes) = RecordingLinks::new(&self.sysfs());
        let provisioner = Provisioner::new(
            &self.config_path(),
            Box::new(links),
            Box::new(SysfsDeviceBinder::with_root(self.sysfs())),
            &SysfsPciResolver::with_root(self.sysfs()),
        )?;
        Ok((provisioner, writes))
    }
}

fn guid(s: &str) -> Guid {
    s.parse().unwrap()
}

#[test]
fn test_end_to_end_table_lookups() {
    let host = FakeHost::new();
    host.add_pf("ib216s0f0", "00:11:22:33:44:55:66:77", 4, "0000:3b:00.0");
    host.write_config(TABLE_CONFIG);

    let (provisioner, _) = host.provisioner().unwrap();
    let pool = provisioner.pool().expect("config exists, pool expected");

    assert_eq!(pool.len(), 2);
    assert_eq!(pool.next_free_guid("0000:3b:00.0", 0).unwrap().to_string(), "00:00:00:00:00:00:00:00");
    assert_eq!(pool.next_free_guid("0000:3b:00.0", 1).unwrap().to_string(), "00:00:00:00:00:00:00:01");
    for (index, expected) in ["00:00:00:00:00:00:01:00", "00:00:00:00:00:00:01:01", "00:00:00:00:00:00:01:02"]
        .iter()
        .enumerate()
    {
        assert_eq!(pool.next_free_guid("0000:3b:00.1", index as u32).unwrap().to_string(), *expected);
    }
    assert!(matches!(
        pool.next_free_guid("0000:3b:00.1", 3),
        Err(IbGuidError::GuidPoolExhausted { .. })
    ));
}

#[test]
fn test_configure_vf_from_pool() {
    let host = FakeHost::new();
    host.add_pf("ib216s0f0", "00:11:22:33:44:55:66:77", 4, "0000:3b:00.1");
    let unbind = host.add_vf("0000:3b:00.4", "mlx5_core");
    host.write_config(TABLE_CONFIG);

    let (provisioner, writes) = host.provisioner().unwrap();
    let pf_link = provisioner.find_link("ib216s0f0").unwrap();

    provisioner.configure_vf_guid("0000:3b:00.4", "0000:3b:00.1", 2, &pf_link).unwrap();

    let expected = guid("00:00:00:00:00:00:01:02");
    assert_eq!(
        *writes.lock().unwrap(),
        vec![
            ("node_guid", "ib216s0f0".to_string(), 2, expected),
            ("port_guid", "ib216s0f0".to_string(), 2, expected),
        ]
    );
    assert_eq!(fs::read_to_string(unbind).unwrap(), "0000:3b:00.4");
}

#[test]
fn test_configure_is_repeatable_for_same_vf() {
    let host = FakeHost::new();
    host.add_pf("ib216s0f0", "00:11:22:33:44:55:66:77", 4, "0000:3b:00.0");
    host.add_vf("0000:3b:00.2", "mlx5_core");
    host.write_config(TABLE_CONFIG);

    let (provisioner, writes) = host.provisioner().unwrap();
    let pf_link = provisioner.find_link("ib216s0f0").unwrap();

    provisioner.configure_vf_guid("0000:3b:00.2", "0000:3b:00.0", 1, &pf_link).unwrap();
    provisioner.configure_vf_guid("0000:3b:00.2", "0000:3b:00.0", 1, &pf_link).unwrap();

    let writes = writes.lock().unwrap();
    assert_eq!(writes.len(), 4);
    assert!(writes.iter().all(|w| w.3 == guid("00:00:00:00:00:00:00:01")));
}

#[test]
fn test_pf_guid_record_resolves_through_sysfs() {
    let host = FakeHost::new();
    host.add_pf("ib216s0f0", "00:11:22:33:44:55:66:77", 4, "0000:3b:00.0");
    host.add_pf("ib216s0f1", "00:11:22:33:44:55:66:78", 5, "0000:3b:00.1");
    host.write_config(
        r#"[{"pfGuid":"00:11:22:33:44:55:66:78","rangeStart":"00:00:00:00:00:00:02:00","rangeEnd":"00:00:00:00:00:00:02:ff"}]"#,
    );

    let (provisioner, _) = host.provisioner().unwrap();
    let pool = provisioner.pool().unwrap();

    assert_eq!(pool.next_free_guid("0000:3b:00.1", 0x10).unwrap(), guid("00:00:00:00:00:00:02:10"));
    assert!(matches!(pool.next_free_guid("0000:3b:00.0", 0), Err(IbGuidError::NoGuidPool { .. })));
}

#[test]
fn test_missing_config_uses_random_guids() {
    let host = FakeHost::new();
    host.add_pf("ib216s0f0", "00:11:22:33:44:55:66:77", 4, "0000:3b:00.0");
    host.add_vf("0000:3b:00.2", "mlx5_core");

    let (provisioner, writes) = host.provisioner().unwrap();
    assert!(!provisioner.has_pool());

    let pf_link = provisioner.find_link("ib216s0f0").unwrap();
    provisioner.configure_vf_guid("0000:3b:00.2", "0000:3b:00.0", 0, &pf_link).unwrap();

    let writes = writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].3, writes[1].3);
}

#[test]
fn test_invalid_config_is_fatal() {
    let host = FakeHost::new();
    host.add_pf("ib216s0f0", "00:11:22:33:44:55:66:77", 4, "0000:3b:00.0");

    host.write_config("[invalid file]");
    assert!(matches!(host.provisioner(), Err(IbGuidError::ConfigDecode { .. })));

    host.write_config(r#"[{"pciAddress":"0000:3b:00.0","rangeStart":"00:00:00:00:00:00:00:02","rangeEnd":"00:00:00:00:00:00:00:01"}]"#);
    assert!(matches!(host.provisioner(), Err(IbGuidError::InvalidRange { .. })));

    host.write_config(r#"[{"pfGuid":"00:00:00:00:00:00:00:99","guids":["00:00:00:00:00:00:00:01"]}]"#);
    let err = host.provisioner().unwrap_err();
    assert_eq!(err.to_string(), "no matching link found for pf guid: 00:00:00:00:00:00:00:99");
}

#[test]
fn test_pool_from_table_matches_pool_from_file() {
    let host = FakeHost::new();
    let path = host.write_config(TABLE_CONFIG);
    fs::create_dir_all(host.sysfs().join("class/net")).unwrap();

    let from_file = GuidPool::from_config_file(
        &path,
        &IpLinkManager::with_root(host.sysfs()),
        &SysfsPciResolver::with_root(host.sysfs()),
    )
    .unwrap();
    let table = ibguid_core::config::load_guid_config(&path, &[], &SysfsPciResolver::with_root(host.sysfs()))
        .unwrap();

    assert_eq!(from_file.table(), &table);
}
