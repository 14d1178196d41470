//! Payload records handed to the transport.
//!
//! Each record is a plain typed struct; [`SpecKind`] names the remote type
//! a record (or backing / device variant) is serialized as.

use crate::devices::{BackingInfo, EthernetCardModel, VirtualDevice};
use crate::types::ManagedObjectRef;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Kind tags
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Remote type of a payload record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecKind {
    VirtualMachineConfigSpec,
    VirtualMachineFileInfo,
    ToolsConfigInfo,
    OptionValue,
    VirtualDeviceConfigSpec,
    VirtualDeviceConnectInfo,
    VirtualLsiLogicController,
    VirtualBusLogicController,
    VirtualLsiLogicSasController,
    VirtualIdeController,
    VirtualDisk,
    VirtualCdrom,
    /// Concrete NIC type, e.g. `VirtualVmxnet3`
    EthernetCard(EthernetCardModel),
    VirtualDiskFlatVer2BackingInfo,
    VirtualDiskRawDiskMappingVer1BackingInfo,
    VirtualEthernetCardOpaqueNetworkBackingInfo,
    VirtualEthernetCardDistributedVirtualPortBackingInfo,
    DistributedVirtualSwitchPortConnection,
    VirtualEthernetCardNetworkBackingInfo,
    VirtualCdromIsoBackingInfo,
    VirtualMachineCloneSpec,
    VirtualMachineRelocateSpec,
    VirtualDiskSpec,
    FileBackedVirtualDiskSpec,
    DeviceBackedVirtualDiskSpec,
    HostPortGroupSpec,
    HostNetworkPolicy,
    HostNicTeamingPolicy,
    HostDatastoreBrowserSearchSpec,
}

impl SpecKind {
    pub fn wsdl_name(&self) -> &str {
        match self {
            Self::VirtualMachineConfigSpec => "VirtualMachineConfigSpec",
            Self::VirtualMachineFileInfo => "VirtualMachineFileInfo",
            Self::ToolsConfigInfo => "ToolsConfigInfo",
            Self::OptionValue => "OptionValue",
            Self::VirtualDeviceConfigSpec => "VirtualDeviceConfigSpec",
            Self::VirtualDeviceConnectInfo => "VirtualDeviceConnectInfo",
            Self::VirtualLsiLogicController => "VirtualLsiLogicController",
            Self::VirtualBusLogicController => "VirtualBusLogicController",
            Self::VirtualLsiLogicSasController => "VirtualLsiLogicSASController",
            Self::VirtualIdeController => "VirtualIDEController",
            Self::VirtualDisk => "VirtualDisk",
            Self::VirtualCdrom => "VirtualCdrom",
            Self::EthernetCard(model) => model.wsdl_name(),
            Self::VirtualDiskFlatVer2BackingInfo => "VirtualDiskFlatVer2BackingInfo",
            Self::VirtualDiskRawDiskMappingVer1BackingInfo => {
                "VirtualDiskRawDiskMappingVer1BackingInfo"
            }
            Self::VirtualEthernetCardOpaqueNetworkBackingInfo => {
                "VirtualEthernetCardOpaqueNetworkBackingInfo"
            }
            Self::VirtualEthernetCardDistributedVirtualPortBackingInfo => {
                "VirtualEthernetCardDistributedVirtualPortBackingInfo"
            }
            Self::DistributedVirtualSwitchPortConnection => {
                "DistributedVirtualSwitchPortConnection"
            }
            Self::VirtualEthernetCardNetworkBackingInfo => "VirtualEthernetCardNetworkBackingInfo",
            Self::VirtualCdromIsoBackingInfo => "VirtualCdromIsoBackingInfo",
            Self::VirtualMachineCloneSpec => "VirtualMachineCloneSpec",
            Self::VirtualMachineRelocateSpec => "VirtualMachineRelocateSpec",
            Self::VirtualDiskSpec => "VirtualDiskSpec",
            Self::FileBackedVirtualDiskSpec => "FileBackedVirtualDiskSpec",
            Self::DeviceBackedVirtualDiskSpec => "DeviceBackedVirtualDiskSpec",
            Self::HostPortGroupSpec => "HostPortGroupSpec",
            Self::HostNetworkPolicy => "HostNetworkPolicy",
            Self::HostNicTeamingPolicy => "HostNicTeamingPolicy",
            Self::HostDatastoreBrowserSearchSpec => "HostDatastoreBrowserSearchSpec",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wsdl_name())
    }
}

/// A record the transport serializes as a remote data object.
pub trait VimSpec {
    fn kind(&self) -> SpecKind;
}

macro_rules! impl_vim_spec {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl VimSpec for $ty {
                fn kind(&self) -> SpecKind {
                    SpecKind::$kind
                }
            }
        )*
    };
}

impl VimSpec for BackingInfo {
    fn kind(&self) -> SpecKind {
        match self {
            Self::FlatFile { .. } => SpecKind::VirtualDiskFlatVer2BackingInfo,
            Self::RawDiskMapping { .. } => SpecKind::VirtualDiskRawDiskMappingVer1BackingInfo,
            Self::OpaqueNetwork { .. } => SpecKind::VirtualEthernetCardOpaqueNetworkBackingInfo,
            Self::DistributedPortgroup { .. } => {
                SpecKind::VirtualEthernetCardDistributedVirtualPortBackingInfo
            }
            Self::NamedNetwork { .. } => SpecKind::VirtualEthernetCardNetworkBackingInfo,
            Self::IsoImage { .. } => SpecKind::VirtualCdromIsoBackingInfo,
        }
    }
}

impl VimSpec for VirtualDevice {
    fn kind(&self) -> SpecKind {
        use crate::devices::AdapterType;
        match self {
            Self::Controller { adapter, .. } => match adapter {
                AdapterType::Ide => SpecKind::VirtualIdeController,
                AdapterType::BusLogic => SpecKind::VirtualBusLogicController,
                AdapterType::LsiLogic => SpecKind::VirtualLsiLogicController,
                AdapterType::LsiLogicSas => SpecKind::VirtualLsiLogicSasController,
            },
            Self::Disk { .. } => SpecKind::VirtualDisk,
            Self::Cdrom { .. } => SpecKind::VirtualCdrom,
            Self::NetworkAdapter { model, .. } => SpecKind::EthernetCard(model.clone()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `VirtualMachineFileInfo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineFileInfo {
    pub vm_path_name: String,
}

/// Tools auto-actions (`ToolsConfigInfo`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfigInfo {
    pub after_power_on: bool,
    pub after_resume: bool,
    pub before_guest_standby: bool,
    pub before_guest_shutdown: bool,
    pub before_guest_reboot: bool,
}

impl ToolsConfigInfo {
    pub fn all_enabled() -> Self {
        Self {
            after_power_on: true,
            after_resume: true,
            before_guest_standby: true,
            before_guest_shutdown: true,
            before_guest_reboot: true,
        }
    }
}

/// One `extraConfig` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    pub key: String,
    pub value: String,
}

impl OptionValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceOperation {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileOperation {
    Create,
    Destroy,
}

/// One add/remove instruction (`VirtualDeviceConfigSpec`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceChangeSpec {
    pub operation: DeviceOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_operation: Option<FileOperation>,
    pub device: VirtualDevice,
}

impl DeviceChangeSpec {
    pub fn add(device: VirtualDevice) -> Self {
        Self {
            operation: DeviceOperation::Add,
            file_operation: None,
            device,
        }
    }

    pub fn create(device: VirtualDevice) -> Self {
        Self {
            file_operation: Some(FileOperation::Create),
            ..Self::add(device)
        }
    }

    pub fn remove_and_destroy(device: VirtualDevice) -> Self {
        Self {
            operation: DeviceOperation::Remove,
            file_operation: Some(FileOperation::Destroy),
            device,
        }
    }
}

/// `VirtualMachineConfigSpec`. Unset fields are left untouched by a
/// reconfigure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "nestedHVEnabled")]
    pub nested_hv_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<VirtualMachineFileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfigInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "numCPUs")]
    pub num_cpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "memoryMB")]
    pub memory_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_change: Vec<DeviceChangeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_config: Vec<OptionValue>,
}

impl ConfigSpec {
    /// Value of the `extraConfig` entry for `key`.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.extra_config
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.value.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Clone / relocate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `VirtualMachineRelocateSpec`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<ManagedObjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<ManagedObjectRef>,
    pub disk_move_type: String,
}

/// `VirtualMachineCloneSpec`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSpec {
    pub location: RelocateSpec,
    pub power_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ManagedObjectRef>,
    pub template: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Virtual disk manager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Arguments of the virtual disk manager's copy / create calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VirtualDiskSpec {
    #[serde(rename_all = "camelCase")]
    Copy { adapter_type: String, disk_type: String },
    #[serde(rename_all = "camelCase")]
    FileBacked {
        adapter_type: String,
        disk_type: String,
        capacity_kb: i64,
    },
    #[serde(rename_all = "camelCase")]
    DeviceBacked {
        adapter_type: String,
        disk_type: String,
        device: String,
    },
}

impl VirtualDiskSpec {
    pub fn adapter_type(&self) -> &str {
        match self {
            Self::Copy { adapter_type, .. }
            | Self::FileBacked { adapter_type, .. }
            | Self::DeviceBacked { adapter_type, .. } => adapter_type,
        }
    }

    pub fn disk_type(&self) -> &str {
        match self {
            Self::Copy { disk_type, .. }
            | Self::FileBacked { disk_type, .. }
            | Self::DeviceBacked { disk_type, .. } => disk_type,
        }
    }
}

impl VimSpec for VirtualDiskSpec {
    fn kind(&self) -> SpecKind {
        match self {
            Self::Copy { .. } => SpecKind::VirtualDiskSpec,
            Self::FileBacked { .. } => SpecKind::FileBackedVirtualDiskSpec,
            Self::DeviceBacked { .. } => SpecKind::DeviceBackedVirtualDiskSpec,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Host networking / datastore browser
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNicTeamingPolicy {
    pub notify_switches: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNetworkPolicy {
    pub nic_teaming: HostNicTeamingPolicy,
}

/// `HostPortGroupSpec`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPortGroupSpec {
    pub name: String,
    pub vswitch_name: String,
    /// 0 disables VLAN tagging
    pub vlan_id: i32,
    pub policy: HostNetworkPolicy,
}

/// `HostDatastoreBrowserSearchSpec`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDatastoreBrowserSearchSpec {
    pub match_pattern: Vec<String>,
}

impl_vim_spec! {
    ConfigSpec => VirtualMachineConfigSpec,
    VirtualMachineFileInfo => VirtualMachineFileInfo,
    ToolsConfigInfo => ToolsConfigInfo,
    OptionValue => OptionValue,
    DeviceChangeSpec => VirtualDeviceConfigSpec,
    crate::devices::ConnectInfo => VirtualDeviceConnectInfo,
    crate::devices::DvsPortConnection => DistributedVirtualSwitchPortConnection,
    CloneSpec => VirtualMachineCloneSpec,
    RelocateSpec => VirtualMachineRelocateSpec,
    HostPortGroupSpec => HostPortGroupSpec,
    HostNetworkPolicy => HostNetworkPolicy,
    HostNicTeamingPolicy => HostNicTeamingPolicy,
    HostDatastoreBrowserSearchSpec => HostDatastoreBrowserSearchSpec,
}
