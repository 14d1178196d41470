//! Virtual hardware devices and their backings.
//!
//! A closed set of device and backing variants, used both for devices the
//! builders add and for hardware lists read back from a VM. Inspection
//! helpers at the bottom match on variants only.

use crate::types::ManagedObjectRef;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Adapter / disk kinds
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Storage adapter kind of a disk controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterType {
    #[serde(rename = "ide")]
    Ide,
    #[serde(rename = "busLogic")]
    BusLogic,
    #[serde(rename = "lsiLogic")]
    LsiLogic,
    #[serde(rename = "lsiLogicsas")]
    LsiLogicSas,
}

impl AdapterType {
    /// Unrecognized kinds fall back to `lsiLogic`.
    pub fn parse(s: &str) -> Self {
        match s {
            "ide" => Self::Ide,
            "busLogic" => Self::BusLogic,
            "lsiLogicsas" => Self::LsiLogicSas,
            _ => Self::LsiLogic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ide => "ide",
            Self::BusLogic => "busLogic",
            Self::LsiLogic => "lsiLogic",
            Self::LsiLogicSas => "lsiLogicsas",
        }
    }

    /// Kind of controller synthesized for a disk on this adapter.
    /// IDE controllers are never created, so they map to lsiLogic.
    pub fn controller_kind(&self) -> Self {
        match self {
            Self::BusLogic => Self::BusLogic,
            Self::LsiLogicSas => Self::LsiLogicSas,
            _ => Self::LsiLogic,
        }
    }

    pub fn controller_wsdl_name(&self) -> &'static str {
        match self {
            Self::Ide => "VirtualIDEController",
            Self::BusLogic => "VirtualBusLogicController",
            Self::LsiLogic => "VirtualLsiLogicController",
            Self::LsiLogicSas => "VirtualLsiLogicSASController",
        }
    }
}

impl Default for AdapterType {
    fn default() -> Self {
        Self::LsiLogic
    }
}

/// Adapter type as written into a vmdk descriptor. The descriptor has no
/// SAS variant.
pub fn vmdk_adapter_type(adapter_type: &str) -> &str {
    match adapter_type {
        "lsiLogicsas" => "lsiLogic",
        other => other,
    }
}

/// Provisioning / backing kind of a virtual disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiskType {
    Thin,
    EagerZeroedThick,
    Preallocated,
    /// Raw device mapping, virtual compatibility
    Rdm,
    /// Raw device mapping, physical compatibility
    Rdmp,
}

impl DiskType {
    /// Unrecognized kinds are treated as `preallocated`.
    pub fn parse(s: &str) -> Self {
        match s {
            "thin" => Self::Thin,
            "eagerZeroedThick" => Self::EagerZeroedThick,
            "rdm" => Self::Rdm,
            "rdmp" => Self::Rdmp,
            _ => Self::Preallocated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::EagerZeroedThick => "eagerZeroedThick",
            Self::Preallocated => "preallocated",
            Self::Rdm => "rdm",
            Self::Rdmp => "rdmp",
        }
    }

    pub fn is_raw_mapping(&self) -> bool {
        matches!(self, Self::Rdm | Self::Rdmp)
    }
}

impl Default for DiskType {
    fn default() -> Self {
        Self::Preallocated
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Backings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `DistributedVirtualSwitchPortConnection`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DvsPortConnection {
    pub switch_uuid: String,
    pub portgroup_key: String,
}

/// Where a device's data lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackingInfo {
    /// `VirtualDiskFlatVer2BackingInfo`
    #[serde(rename_all = "camelCase")]
    FlatFile {
        file_name: String,
        disk_mode: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thin_provisioned: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eagerly_scrub: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<Box<BackingInfo>>,
        /// Assigned by the server
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<String>,
    },
    /// `VirtualDiskRawDiskMappingVer1BackingInfo`
    #[serde(rename_all = "camelCase")]
    RawDiskMapping {
        file_name: String,
        device_name: String,
        compatibility_mode: String,
        disk_mode: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lun_uuid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<Box<BackingInfo>>,
    },
    #[serde(rename_all = "camelCase")]
    OpaqueNetwork {
        network_id: String,
        network_type: String,
    },
    #[serde(rename_all = "camelCase")]
    DistributedPortgroup { port: DvsPortConnection },
    #[serde(rename_all = "camelCase")]
    NamedNetwork { device_name: String },
    #[serde(rename_all = "camelCase")]
    IsoImage {
        datastore: ManagedObjectRef,
        file_name: String,
    },
}

impl BackingInfo {
    /// Flat-file disk backing with exactly one (or none) of the
    /// provisioning flags set.
    pub fn flat_file(file_name: impl Into<String>, disk_type: DiskType) -> Self {
        Self::FlatFile {
            file_name: file_name.into(),
            disk_mode: "persistent".into(),
            thin_provisioned: (disk_type == DiskType::Thin).then_some(true),
            eagerly_scrub: (disk_type == DiskType::EagerZeroedThick).then_some(true),
            parent: None,
            uuid: None,
        }
    }

    pub fn raw_disk_mapping(
        file_name: impl Into<String>,
        device_name: impl Into<String>,
        physical: bool,
    ) -> Self {
        Self::RawDiskMapping {
            file_name: file_name.into(),
            device_name: device_name.into(),
            compatibility_mode: if physical { "physicalMode" } else { "virtualMode" }.into(),
            disk_mode: "independent_persistent".into(),
            lun_uuid: None,
            parent: None,
        }
    }

    /// Disk backing for `disk_type` over `file_name`.
    pub fn for_disk(file_name: impl Into<String>, disk_type: DiskType, device_name: Option<&str>) -> Self {
        match disk_type {
            DiskType::Rdm | DiskType::Rdmp => Self::raw_disk_mapping(
                file_name,
                device_name.unwrap_or_default(),
                disk_type == DiskType::Rdmp,
            ),
            other => Self::flat_file(file_name, other),
        }
    }

    /// Copy-on-write child: a shallow copy with the file name cleared and
    /// `parent` pointing at the original. Non-disk backings are returned
    /// unchanged.
    pub fn linked_clone(self) -> Self {
        let base = Box::new(self.clone());
        match self {
            Self::FlatFile {
                disk_mode,
                thin_provisioned,
                eagerly_scrub,
                uuid,
                ..
            } => Self::FlatFile {
                file_name: String::new(),
                disk_mode,
                thin_provisioned,
                eagerly_scrub,
                parent: Some(base),
                uuid,
            },
            Self::RawDiskMapping {
                device_name,
                compatibility_mode,
                disk_mode,
                lun_uuid,
                ..
            } => Self::RawDiskMapping {
                file_name: String::new(),
                device_name,
                compatibility_mode,
                disk_mode,
                lun_uuid,
                parent: Some(base),
            },
            other => other,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::FlatFile { file_name, .. }
            | Self::RawDiskMapping { file_name, .. }
            | Self::IsoImage { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    pub fn wsdl_name(&self) -> &'static str {
        match self {
            Self::FlatFile { .. } => "VirtualDiskFlatVer2BackingInfo",
            Self::RawDiskMapping { .. } => "VirtualDiskRawDiskMappingVer1BackingInfo",
            Self::OpaqueNetwork { .. } => "VirtualEthernetCardOpaqueNetworkBackingInfo",
            Self::DistributedPortgroup { .. } => {
                "VirtualEthernetCardDistributedVirtualPortBackingInfo"
            }
            Self::NamedNetwork { .. } => "VirtualEthernetCardNetworkBackingInfo",
            Self::IsoImage { .. } => "VirtualCdromIsoBackingInfo",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Devices
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `VirtualDeviceConnectInfo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    pub start_connected: bool,
    pub allow_guest_control: bool,
    pub connected: bool,
}

impl ConnectInfo {
    /// Connected at power-on, guest may toggle it.
    pub fn guest_controlled() -> Self {
        Self {
            start_connected: true,
            allow_guest_control: true,
            connected: true,
        }
    }

    /// Connected at power-on, guest may not toggle it.
    pub fn pinned() -> Self {
        Self {
            start_connected: true,
            allow_guest_control: false,
            connected: true,
        }
    }
}

/// NIC model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EthernetCardModel {
    E1000,
    E1000e,
    PcNet32,
    Vmxnet,
    Vmxnet2,
    Vmxnet3,
    /// Remote type name passed through as given
    Other(String),
}

impl EthernetCardModel {
    /// Accepts `e1000` or a remote type name such as `VirtualVmxnet3`.
    pub fn from_vif_model(model: &str) -> Self {
        match model {
            "e1000" | "VirtualE1000" => Self::E1000,
            "e1000e" | "VirtualE1000e" => Self::E1000e,
            "pcnet32" | "VirtualPCNet32" => Self::PcNet32,
            "vmxnet" | "VirtualVmxnet" => Self::Vmxnet,
            "vmxnet2" | "VirtualVmxnet2" => Self::Vmxnet2,
            "vmxnet3" | "VirtualVmxnet3" => Self::Vmxnet3,
            other => {
                log::debug!("Passing vif model '{}' through as a remote type", other);
                Self::Other(other.to_string())
            }
        }
    }

    pub fn wsdl_name(&self) -> &str {
        match self {
            Self::E1000 => "VirtualE1000",
            Self::E1000e => "VirtualE1000e",
            Self::PcNet32 => "VirtualPCNet32",
            Self::Vmxnet => "VirtualVmxnet",
            Self::Vmxnet2 => "VirtualVmxnet2",
            Self::Vmxnet3 => "VirtualVmxnet3",
            Self::Other(name) => name,
        }
    }
}

/// A virtual hardware device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VirtualDevice {
    #[serde(rename_all = "camelCase")]
    Controller {
        adapter: AdapterType,
        key: i32,
        bus_number: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shared_bus: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Disk {
        key: i32,
        controller_key: i32,
        unit_number: i32,
        capacity_in_kb: i64,
        backing: BackingInfo,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connectable: Option<ConnectInfo>,
    },
    #[serde(rename_all = "camelCase")]
    Cdrom {
        key: i32,
        controller_key: i32,
        unit_number: i32,
        backing: BackingInfo,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connectable: Option<ConnectInfo>,
    },
    #[serde(rename_all = "camelCase")]
    NetworkAdapter {
        model: EthernetCardModel,
        key: i32,
        backing: BackingInfo,
        mac_address: String,
        address_type: String,
        wake_on_lan_enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connectable: Option<ConnectInfo>,
    },
}

impl VirtualDevice {
    pub fn key(&self) -> i32 {
        match self {
            Self::Controller { key, .. }
            | Self::Disk { key, .. }
            | Self::Cdrom { key, .. }
            | Self::NetworkAdapter { key, .. } => *key,
        }
    }

    pub fn controller_key(&self) -> Option<i32> {
        match self {
            Self::Disk { controller_key, .. } | Self::Cdrom { controller_key, .. } => {
                Some(*controller_key)
            }
            _ => None,
        }
    }

    pub fn backing(&self) -> Option<&BackingInfo> {
        match self {
            Self::Disk { backing, .. }
            | Self::Cdrom { backing, .. }
            | Self::NetworkAdapter { backing, .. } => Some(backing),
            Self::Controller { .. } => None,
        }
    }

    pub fn wsdl_name(&self) -> &str {
        match self {
            Self::Controller { adapter, .. } => adapter.controller_wsdl_name(),
            Self::Disk { .. } => "VirtualDisk",
            Self::Cdrom { .. } => "VirtualCdrom",
            Self::NetworkAdapter { model, .. } => model.wsdl_name(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Hardware list inspection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Root disk details read from a VM's hardware list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmdkInfo {
    /// Datastore path of the last flat-file disk
    pub file_path: Option<String>,
    pub controller_key: Option<i32>,
    /// Adapter of that disk's controller, if the controller is in the list
    pub adapter_type: Option<AdapterType>,
    pub disk_type: Option<DiskType>,
    /// Highest unit number of any disk
    pub unit_number: i32,
}

pub fn vmdk_path_and_adapter_type(devices: &[VirtualDevice]) -> VmdkInfo {
    let mut info = VmdkInfo::default();
    let mut adapters = HashMap::new();

    for device in devices {
        match device {
            VirtualDevice::Disk {
                controller_key,
                unit_number,
                backing,
                ..
            } => {
                if let BackingInfo::FlatFile {
                    file_name,
                    thin_provisioned,
                    eagerly_scrub,
                    ..
                } = backing
                {
                    info.file_path = Some(file_name.clone());
                    info.controller_key = Some(*controller_key);
                    info.disk_type = Some(if thin_provisioned.unwrap_or(false) {
                        DiskType::Thin
                    } else if eagerly_scrub.unwrap_or(false) {
                        DiskType::EagerZeroedThick
                    } else {
                        DiskType::Preallocated
                    });
                }
                info.unit_number = info.unit_number.max(*unit_number);
            }
            VirtualDevice::Controller { adapter, key, .. } => {
                adapters.insert(*key, *adapter);
            }
            _ => {}
        }
    }

    info.adapter_type = info
        .controller_key
        .and_then(|k| adapters.get(&k).copied());
    info
}

/// Raw-mapped disk whose LUN uuid is `lun_uuid`.
pub fn find_rdm_disk<'a>(devices: &'a [VirtualDevice], lun_uuid: &str) -> Option<&'a VirtualDevice> {
    devices.iter().find(|d| {
        matches!(
            d,
            VirtualDevice::Disk {
                backing: BackingInfo::RawDiskMapping { lun_uuid: Some(u), .. },
                ..
            } if u == lun_uuid
        )
    })
}

/// Backing uuid of the flat-file disk whose file name contains `volume_id`.
pub fn vmdk_backed_disk_uuid<'a>(devices: &'a [VirtualDevice], volume_id: &str) -> Option<&'a str> {
    devices
        .iter()
        .find_map(|d| match d {
            VirtualDevice::Disk {
                backing: BackingInfo::FlatFile { file_name, uuid, .. },
                ..
            } if file_name.contains(volume_id) => Some(uuid),
            _ => None,
        })
        .and_then(|uuid| uuid.as_deref())
}

/// Flat-file disk whose backing uuid is `uuid`.
pub fn vmdk_backed_disk_device<'a>(devices: &'a [VirtualDevice], uuid: &str) -> Option<&'a VirtualDevice> {
    devices.iter().find(|d| {
        matches!(
            d,
            VirtualDevice::Disk {
                backing: BackingInfo::FlatFile { uuid: Some(u), .. },
                ..
            } if u == uuid
        )
    })
}

pub fn first_virtual_disk(devices: &[VirtualDevice]) -> Option<&VirtualDevice> {
    devices
        .iter()
        .find(|d| matches!(d, VirtualDevice::Disk { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(key: i32, controller_key: i32, unit: i32, backing: BackingInfo) -> VirtualDevice {
        VirtualDevice::Disk {
            key,
            controller_key,
            unit_number: unit,
            capacity_in_kb: 1024,
            backing,
            connectable: None,
        }
    }

    fn controller(adapter: AdapterType, key: i32) -> VirtualDevice {
        VirtualDevice::Controller {
            adapter,
            key,
            bus_number: 0,
            shared_bus: None,
        }
    }

    fn flat_with_uuid(file: &str, uuid: &str) -> BackingInfo {
        match BackingInfo::flat_file(file, DiskType::Preallocated) {
            BackingInfo::FlatFile {
                file_name,
                disk_mode,
                ..
            } => BackingInfo::FlatFile {
                file_name,
                disk_mode,
                thin_provisioned: None,
                eagerly_scrub: None,
                parent: None,
                uuid: Some(uuid.into()),
            },
            other => other,
        }
    }

    #[test]
    fn adapter_type_mapping() {
        let cases = [
            ("ide", AdapterType::LsiLogic),
            ("busLogic", AdapterType::BusLogic),
            ("lsiLogic", AdapterType::LsiLogic),
            ("lsiLogicsas", AdapterType::LsiLogicSas),
            ("pvscsi-ish", AdapterType::LsiLogic),
        ];
        for (input, expected) in cases {
            assert_eq!(AdapterType::parse(input).controller_kind(), expected, "{input}");
        }
        assert_eq!(AdapterType::parse("ide"), AdapterType::Ide);
        assert_eq!(AdapterType::parse("anything"), AdapterType::LsiLogic);
    }

    #[test]
    fn vmdk_descriptor_adapter() {
        assert_eq!(vmdk_adapter_type("lsiLogicsas"), "lsiLogic");
        for s in ["ide", "busLogic", "lsiLogic", "paraVirtual"] {
            assert_eq!(vmdk_adapter_type(s), s);
        }
    }

    #[test]
    fn disk_type_flags_exclusive() {
        let flags = |b: BackingInfo| match b {
            BackingInfo::FlatFile {
                thin_provisioned,
                eagerly_scrub,
                ..
            } => (thin_provisioned, eagerly_scrub),
            other => panic!("unexpected backing {other:?}"),
        };
        assert_eq!(flags(BackingInfo::for_disk("", DiskType::parse("thin"), None)), (Some(true), None));
        assert_eq!(
            flags(BackingInfo::for_disk("", DiskType::parse("eagerZeroedThick"), None)),
            (None, Some(true))
        );
        assert_eq!(flags(BackingInfo::for_disk("", DiskType::parse("preallocated"), None)), (None, None));
        assert_eq!(flags(BackingInfo::for_disk("", DiskType::parse("sparse"), None)), (None, None));
    }

    #[test]
    fn rdm_compatibility_modes() {
        for (kind, mode) in [("rdm", "virtualMode"), ("rdmp", "physicalMode")] {
            match BackingInfo::for_disk("", DiskType::parse(kind), Some("/vmfs/devices/disks/naa.1")) {
                BackingInfo::RawDiskMapping {
                    compatibility_mode,
                    disk_mode,
                    device_name,
                    ..
                } => {
                    assert_eq!(compatibility_mode, mode);
                    assert_eq!(disk_mode, "independent_persistent");
                    assert_eq!(device_name, "/vmfs/devices/disks/naa.1");
                }
                other => panic!("unexpected backing {other:?}"),
            }
        }
    }

    #[test]
    fn linked_clone_points_at_base() {
        let base = BackingInfo::flat_file("[ds1] base/base.vmdk", DiskType::Thin);
        let child = base.clone().linked_clone();
        match &child {
            BackingInfo::FlatFile {
                file_name, parent, thin_provisioned, ..
            } => {
                assert!(file_name.is_empty());
                assert_eq!(parent.as_deref(), Some(&base));
                assert_eq!(*thin_provisioned, Some(true));
            }
            other => panic!("unexpected backing {other:?}"),
        }
    }

    #[test]
    fn unknown_vif_model_passes_through() {
        assert_eq!(EthernetCardModel::from_vif_model("e1000"), EthernetCardModel::E1000);
        assert_eq!(EthernetCardModel::from_vif_model("VirtualVmxnet3"), EthernetCardModel::Vmxnet3);

        let other = EthernetCardModel::from_vif_model("VirtualSriovEthernetCard");
        assert_eq!(other, EthernetCardModel::Other("VirtualSriovEthernetCard".into()));
        assert_eq!(other.wsdl_name(), "VirtualSriovEthernetCard");
    }

    #[test]
    fn vmdk_path_picks_last_flat_disk() {
        let devices = vec![
            controller(AdapterType::Ide, 200),
            controller(AdapterType::LsiLogicSas, 1000),
            disk(2000, 1000, 0, BackingInfo::flat_file("[ds1] vm/a.vmdk", DiskType::Preallocated)),
            disk(2001, 1000, 3, BackingInfo::raw_disk_mapping("[ds1] vm/r.vmdk", "naa.1", true)),
            disk(2002, 1000, 1, BackingInfo::flat_file("[ds1] vm/b.vmdk", DiskType::Thin)),
        ];
        let info = vmdk_path_and_adapter_type(&devices);
        assert_eq!(info.file_path.as_deref(), Some("[ds1] vm/b.vmdk"));
        assert_eq!(info.controller_key, Some(1000));
        assert_eq!(info.adapter_type, Some(AdapterType::LsiLogicSas));
        assert_eq!(info.disk_type, Some(DiskType::Thin));
        assert_eq!(info.unit_number, 3);
    }

    #[test]
    fn vmdk_path_unknown_controller() {
        let devices = vec![disk(
            2000,
            1500,
            0,
            BackingInfo::flat_file("[ds1] vm/a.vmdk", DiskType::EagerZeroedThick),
        )];
        let info = vmdk_path_and_adapter_type(&devices);
        assert_eq!(info.adapter_type, None);
        assert_eq!(info.disk_type, Some(DiskType::EagerZeroedThick));
        assert_eq!(vmdk_path_and_adapter_type(&[]), VmdkInfo::default());
    }

    #[test]
    fn rdm_and_uuid_lookups() {
        let rdm = match BackingInfo::raw_disk_mapping("[ds1] vm/r.vmdk", "naa.1", false) {
            BackingInfo::RawDiskMapping {
                file_name,
                device_name,
                compatibility_mode,
                disk_mode,
                ..
            } => BackingInfo::RawDiskMapping {
                file_name,
                device_name,
                compatibility_mode,
                disk_mode,
                lun_uuid: Some("lun-7".into()),
                parent: None,
            },
            other => other,
        };
        let devices = vec![
            controller(AdapterType::LsiLogic, 1000),
            disk(2000, 1000, 0, flat_with_uuid("[ds1] volume-abc/volume-abc.vmdk", "6000C29a")),
            disk(2001, 1000, 1, rdm),
        ];

        assert_eq!(find_rdm_disk(&devices, "lun-7").map(VirtualDevice::key), Some(2001));
        assert!(find_rdm_disk(&devices, "lun-8").is_none());
        assert_eq!(vmdk_backed_disk_uuid(&devices, "volume-abc"), Some("6000C29a"));
        assert!(vmdk_backed_disk_uuid(&devices, "volume-xyz").is_none());
        assert_eq!(vmdk_backed_disk_device(&devices, "6000C29a").map(VirtualDevice::key), Some(2000));
        assert!(vmdk_backed_disk_device(&devices, "nope").is_none());
        assert_eq!(first_virtual_disk(&devices).map(VirtualDevice::key), Some(2000));

        let no_uuid_first = vec![
            disk(2000, 1000, 0, BackingInfo::flat_file("[ds1] volume-abc/a.vmdk", DiskType::Thin)),
            disk(2001, 1000, 1, flat_with_uuid("[ds1] volume-abc/b.vmdk", "6000C29b")),
        ];
        assert!(vmdk_backed_disk_uuid(&no_uuid_first, "volume-abc").is_none());
        assert!(first_virtual_disk(&devices[..1]).is_none());
    }
}
