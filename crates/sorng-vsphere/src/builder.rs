//! Payload builders.
//!
//! Pure functions that assemble [`ConfigSpec`] trees and the smaller
//! records the transport sends. Nothing here talks to the server.

use crate::device_keys::{DeviceCategory, DeviceKeyAllocator, IDE_CONTROLLER_KEY};
use crate::devices::*;
use crate::spec::*;
use crate::types::*;

/// Guest id that gets nested hardware virtualization.
pub const NESTED_HV_GUEST_ID: &str = "vmkernel5Guest";
pub const DEFAULT_GUEST_ID: &str = "otherGuest";
pub const DEFAULT_DISK_MOVE_TYPE: &str = "moveAllDiskBackingsAndAllowSharing";

/// A disk to add to a VM.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskAttachment {
    pub adapter_type: AdapterType,
    pub disk_type: DiskType,
    /// Existing file to attach; `None` creates a new one
    pub file_path: Option<String>,
    pub capacity_kb: Option<i64>,
    pub linked_clone: bool,
    /// Controller to attach to; `None` picks or creates one
    pub controller_key: Option<i32>,
    pub unit_number: Option<i32>,
    /// Raw device for `rdm` / `rdmp`
    pub device_name: Option<String>,
}

impl Default for DiskAttachment {
    fn default() -> Self {
        Self {
            adapter_type: AdapterType::LsiLogic,
            disk_type: DiskType::Preallocated,
            file_path: None,
            capacity_kb: None,
            linked_clone: false,
            controller_key: None,
            unit_number: None,
            device_name: None,
        }
    }
}

impl DiskAttachment {
    pub fn new(adapter_type: &str, disk_type: &str) -> Self {
        Self {
            adapter_type: AdapterType::parse(adapter_type),
            disk_type: DiskType::parse(disk_type),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ConfigSpecBuilder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Accumulates device changes and options for one request. Every device
/// it adds gets a key from its own allocator.
#[derive(Debug, Default)]
pub struct ConfigSpecBuilder {
    spec: ConfigSpec,
    keys: DeviceKeyAllocator,
}

impl ConfigSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller for `adapter` and return its provisional key.
    pub fn add_controller(&mut self, adapter: AdapterType) -> i32 {
        let key = self.keys.next(DeviceCategory::Controller);
        self.spec.device_change.push(controller_spec(adapter, key));
        key
    }

    pub fn add_network_adapter(&mut self, vif: &VifInfo) -> &mut Self {
        let key = self.keys.next(DeviceCategory::NetworkAdapter);
        self.spec.device_change.push(network_spec(vif, key));
        self
    }

    /// Add a disk. Without an explicit controller key, IDE disks go on the
    /// built-in IDE controller and any other adapter gets a new controller
    /// inserted right before the disk.
    pub fn attach_disk(&mut self, disk: &DiskAttachment) -> &mut Self {
        let controller_key = match disk.controller_key {
            Some(key) => key,
            None if disk.adapter_type == AdapterType::Ide => IDE_CONTROLLER_KEY,
            None => self.add_controller(disk.adapter_type),
        };
        let key = self.keys.next(DeviceCategory::Disk);
        self.spec
            .device_change
            .push(virtual_disk_spec(disk, controller_key, key));
        self
    }

    pub fn attach_cdrom(
        &mut self,
        datastore: &ManagedObjectRef,
        file_path: &str,
        unit_number: i32,
    ) -> &mut Self {
        let key = self.keys.next(DeviceCategory::Cdrom);
        self.spec.device_change.push(cdrom_spec(
            datastore,
            IDE_CONTROLLER_KEY,
            file_path,
            unit_number,
            key,
        ));
        self
    }

    pub fn detach_device(&mut self, device: VirtualDevice) -> &mut Self {
        self.spec
            .device_change
            .push(DeviceChangeSpec::remove_and_destroy(device));
        self
    }

    /// Set an `extraConfig` entry. A key set twice keeps its first position
    /// and takes the later value.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.spec.extra_config.iter_mut().find(|o| o.key == key) {
            Some(existing) => existing.value = value,
            None => self.spec.extra_config.push(OptionValue::new(key, value)),
        }
        self
    }

    pub fn build(self) -> ConfigSpec {
        self.spec
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Device change entries
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn controller_spec(adapter: AdapterType, key: i32) -> DeviceChangeSpec {
    DeviceChangeSpec::add(VirtualDevice::Controller {
        adapter: adapter.controller_kind(),
        key,
        bus_number: 0,
        shared_bus: Some("noSharing".into()),
    })
}

pub fn network_spec(vif: &VifInfo, key: i32) -> DeviceChangeSpec {
    // Distributed ports only work when the portgroup binding is ephemeral.
    let backing = match &vif.network_ref {
        Some(NetworkRef::OpaqueNetwork {
            network_id,
            network_type,
        }) => BackingInfo::OpaqueNetwork {
            network_id: network_id.clone(),
            network_type: network_type.clone(),
        },
        Some(NetworkRef::DistributedVirtualPortgroup {
            dvs_uuid,
            portgroup_key,
        }) => BackingInfo::DistributedPortgroup {
            port: DvsPortConnection {
                switch_uuid: dvs_uuid.clone(),
                portgroup_key: portgroup_key.clone(),
            },
        },
        _ => BackingInfo::NamedNetwork {
            device_name: vif.network_name.clone(),
        },
    };

    DeviceChangeSpec::add(VirtualDevice::NetworkAdapter {
        model: EthernetCardModel::from_vif_model(&vif.vif_model),
        key,
        backing,
        mac_address: vif.mac_address.clone(),
        address_type: "manual".into(),
        wake_on_lan_enabled: true,
        connectable: Some(ConnectInfo::guest_controlled()),
    })
}

pub fn virtual_disk_spec(disk: &DiskAttachment, controller_key: i32, key: i32) -> DeviceChangeSpec {
    let backing = BackingInfo::for_disk(
        disk.file_path.as_deref().unwrap_or_default(),
        disk.disk_type,
        disk.device_name.as_deref(),
    );
    let backing = if disk.linked_clone {
        backing.linked_clone()
    } else {
        backing
    };

    let device = VirtualDevice::Disk {
        key,
        controller_key,
        unit_number: disk.unit_number.unwrap_or(0),
        capacity_in_kb: disk.capacity_kb.unwrap_or(0),
        backing,
        connectable: Some(ConnectInfo::pinned()),
    };

    if disk.file_path.is_none() || disk.linked_clone {
        DeviceChangeSpec::create(device)
    } else {
        DeviceChangeSpec::add(device)
    }
}

pub fn cdrom_spec(
    datastore: &ManagedObjectRef,
    controller_key: i32,
    file_path: &str,
    unit_number: i32,
    key: i32,
) -> DeviceChangeSpec {
    DeviceChangeSpec::add(VirtualDevice::Cdrom {
        key,
        controller_key,
        unit_number,
        backing: BackingInfo::IsoImage {
            datastore: datastore.clone(),
            file_name: file_path.to_string(),
        },
        connectable: Some(ConnectInfo::pinned()),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM config specs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn base_vm_spec(name: &str, guest_id: &str, datastore_name: &str, cpus: u32, memory_mb: u64) -> ConfigSpec {
    ConfigSpec {
        name: Some(name.to_string()),
        guest_id: Some(guest_id.to_string()),
        nested_hv_enabled: (guest_id == NESTED_HV_GUEST_ID).then_some(true),
        files: Some(VirtualMachineFileInfo {
            vm_path_name: format!("[{datastore_name}]"),
        }),
        tools: Some(ToolsConfigInfo::all_enabled()),
        num_cpus: Some(cpus),
        memory_mb: Some(memory_mb),
        ..Default::default()
    }
}

/// Create spec for an instance. The VM is named after the instance uuid.
pub fn vm_create_spec(
    instance: &InstanceInfo,
    datastore_name: &str,
    vifs: &[VifInfo],
    guest_id: Option<&str>,
) -> ConfigSpec {
    let guest_id = guest_id.unwrap_or(DEFAULT_GUEST_ID);
    let mut builder = ConfigSpecBuilder {
        spec: base_vm_spec(
            &instance.uuid,
            guest_id,
            datastore_name,
            instance.vcpus,
            instance.memory_mb,
        ),
        keys: DeviceKeyAllocator::new(),
    };

    for vif in vifs {
        builder.add_network_adapter(vif);
    }

    builder.set_option("nvp.vm-uuid", instance.uuid.as_str());
    let iface_ids = vifs
        .iter()
        .filter_map(|v| v.iface_id.as_deref())
        .filter(|id| !id.is_empty());
    for (i, iface_id) in iface_ids.enumerate() {
        builder.set_option(format!("nvp.iface-id.{i}"), iface_id);
    }

    log::debug!(
        "Built create spec for {} with {} NIC(s) on [{}]",
        instance.uuid,
        vifs.len(),
        datastore_name
    );
    builder.build()
}

/// Placeholder VM used to stage images: one vCPU, 4 MB, a 1 MB disk.
pub fn dummy_vm_create_spec(name: &str, datastore_name: &str) -> ConfigSpec {
    let mut builder = ConfigSpecBuilder {
        spec: base_vm_spec(name, DEFAULT_GUEST_ID, datastore_name, 1, 4),
        keys: DeviceKeyAllocator::new(),
    };
    builder.attach_disk(&DiskAttachment {
        capacity_kb: Some(1024),
        ..Default::default()
    });
    builder.build()
}

pub fn vmdk_attach_config_spec(disk: &DiskAttachment) -> ConfigSpec {
    let mut builder = ConfigSpecBuilder::new();
    builder.attach_disk(disk);
    builder.build()
}

/// Attach an ISO on the built-in IDE controller.
pub fn cdrom_attach_config_spec(
    datastore: &ManagedObjectRef,
    file_path: &str,
    unit_number: i32,
) -> ConfigSpec {
    let mut builder = ConfigSpecBuilder::new();
    builder.attach_cdrom(datastore, file_path, unit_number);
    builder.build()
}

pub fn vmdk_detach_config_spec(device: VirtualDevice) -> ConfigSpec {
    let mut builder = ConfigSpecBuilder::new();
    builder.detach_device(device);
    builder.build()
}

/// One option per pair, in order; a repeated key takes the later value.
pub fn vm_extra_config_spec<I, K, V>(options: I) -> ConfigSpec
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut builder = ConfigSpecBuilder::new();
    for (key, value) in options {
        builder.set_option(key, value);
    }
    builder.build()
}

pub fn machine_id_change_spec(machine_id: &str) -> ConfigSpec {
    vm_extra_config_spec([("machine.id", machine_id)])
}

pub fn vnc_config_spec(port: u16, password: Option<&str>) -> ConfigSpec {
    let mut builder = ConfigSpecBuilder::new();
    builder
        .set_option("RemoteDisplay.vnc.enabled", "true")
        .set_option("RemoteDisplay.vnc.port", port.to_string());
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        log::warn!(
            "Password-protected VNC consoles are deprecated; leave the password unset to disable protection"
        );
        builder.set_option("RemoteDisplay.vnc.password", password);
    }
    builder.build()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Clone / relocate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn clone_vm_spec(
    location: RelocateSpec,
    power_on: bool,
    snapshot: Option<ManagedObjectRef>,
    template: bool,
) -> CloneSpec {
    CloneSpec {
        location,
        power_on,
        snapshot,
        template,
    }
}

pub fn relocate_vm_spec(
    datastore: Option<ManagedObjectRef>,
    host: Option<ManagedObjectRef>,
    disk_move_type: Option<&str>,
) -> RelocateSpec {
    RelocateSpec {
        datastore,
        host,
        disk_move_type: disk_move_type.unwrap_or(DEFAULT_DISK_MOVE_TYPE).to_string(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Disk manager / host / browser specs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn copy_virtual_disk_spec(adapter_type: &str, disk_type: &str) -> VirtualDiskSpec {
    VirtualDiskSpec::Copy {
        adapter_type: vmdk_adapter_type(adapter_type).to_string(),
        disk_type: disk_type.to_string(),
    }
}

pub fn vmdk_create_spec(capacity_kb: i64, adapter_type: &str, disk_type: &str) -> VirtualDiskSpec {
    VirtualDiskSpec::FileBacked {
        adapter_type: vmdk_adapter_type(adapter_type).to_string(),
        disk_type: disk_type.to_string(),
        capacity_kb,
    }
}

/// Raw device disk spec; `disk_type` defaults to `rdmp`.
pub fn rdm_create_spec(device: &str, adapter_type: &str, disk_type: Option<&str>) -> VirtualDiskSpec {
    VirtualDiskSpec::DeviceBacked {
        adapter_type: vmdk_adapter_type(adapter_type).to_string(),
        disk_type: disk_type.unwrap_or("rdmp").to_string(),
        device: device.to_string(),
    }
}

pub fn add_vswitch_port_group_spec(vswitch_name: &str, port_group_name: &str, vlan_id: i32) -> HostPortGroupSpec {
    HostPortGroupSpec {
        name: port_group_name.to_string(),
        vswitch_name: vswitch_name.to_string(),
        vlan_id,
        policy: HostNetworkPolicy {
            nic_teaming: HostNicTeamingPolicy {
                notify_switches: true,
            },
        },
    }
}

pub fn search_datastore_spec(file_name: &str) -> HostDatastoreBrowserSearchSpec {
    HostDatastoreBrowserSearchSpec {
        match_pattern: vec![file_name.to_string()],
    }
}
