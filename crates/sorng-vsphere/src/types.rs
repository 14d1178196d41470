//! Shared types for the vSphere driver core.
//!
//! Managed-object references, property-collector results, the inputs the
//! spec builders consume and the aggregates the queries produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Managed objects
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Managed object types the queries walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    VirtualMachine,
    HostSystem,
    Datastore,
    ClusterComputeResource,
    ResourcePool,
    Network,
    DistributedVirtualPortgroup,
    OpaqueNetwork,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VirtualMachine => "VirtualMachine",
            Self::HostSystem => "HostSystem",
            Self::Datastore => "Datastore",
            Self::ClusterComputeResource => "ClusterComputeResource",
            Self::ResourcePool => "ResourcePool",
            Self::Network => "Network",
            Self::DistributedVirtualPortgroup => "DistributedVirtualPortgroup",
            Self::OpaqueNetwork => "OpaqueNetwork",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "VirtualMachine" => Self::VirtualMachine,
            "HostSystem" => Self::HostSystem,
            "Datastore" => Self::Datastore,
            "ClusterComputeResource" => Self::ClusterComputeResource,
            "ResourcePool" => Self::ResourcePool,
            "Network" => Self::Network,
            "DistributedVirtualPortgroup" => Self::DistributedVirtualPortgroup,
            "OpaqueNetwork" => Self::OpaqueNetwork,
            other => return Err(format!("unknown managed object type '{other}'")),
        })
    }
}

/// Opaque server-assigned handle: a type tag plus a string identity.
///
/// Equality is structural on `(kind, value)`; no ordering is defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    #[serde(rename = "_type")]
    pub kind: String,
    pub value: String,
}

impl ManagedObjectRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Build a reference for one of the known object types.
    pub fn of(object_type: ObjectType, value: impl Into<String>) -> Self {
        Self::new(object_type.as_str(), value)
    }

    pub fn is(&self, object_type: ObjectType) -> bool {
        self.kind == object_type.as_str()
    }
}

impl fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Property collector results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `summary.hardware` of a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostHardwareSummary {
    pub num_cpu_threads: u32,
    pub num_cpu_cores: u32,
    pub vendor: String,
    pub cpu_model: String,
}

/// `summary.runtime.memory` of a resource pool, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePoolMemoryUsage {
    pub max_usage: i64,
    pub overall_usage: i64,
}

/// Value of a single collected property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "val", rename_all = "camelCase")]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Long(i64),
    ManagedObject(ManagedObjectRef),
    ManagedObjectArray(Vec<ManagedObjectRef>),
    HostHardware(HostHardwareSummary),
    MemoryUsage(ResourcePoolMemoryUsage),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_mor(&self) -> Option<&ManagedObjectRef> {
        match self {
            Self::ManagedObject(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mor_array(&self) -> Option<&[ManagedObjectRef]> {
        match self {
            Self::ManagedObjectArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_host_hardware(&self) -> Option<&HostHardwareSummary> {
        match self {
            Self::HostHardware(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_memory_usage(&self) -> Option<ResourcePoolMemoryUsage> {
        match self {
            Self::MemoryUsage(m) => Some(*m),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<ManagedObjectRef> for PropertyValue {
    fn from(m: ManagedObjectRef) -> Self {
        Self::ManagedObject(m)
    }
}

impl From<Vec<ManagedObjectRef>> for PropertyValue {
    fn from(v: Vec<ManagedObjectRef>) -> Self {
        Self::ManagedObjectArray(v)
    }
}

/// One `(name, value)` pair of an object's property set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicProperty {
    pub name: String,
    pub val: PropertyValue,
}

impl DynamicProperty {
    pub fn new(name: impl Into<String>, val: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            val: val.into(),
        }
    }
}

/// A single object of a result page with its requested properties,
/// in the order they were declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub obj: ManagedObjectRef,
    #[serde(default)]
    pub prop_set: Vec<DynamicProperty>,
}

impl ObjectContent {
    pub fn new(obj: ManagedObjectRef) -> Self {
        Self {
            obj,
            prop_set: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: &str, val: impl Into<PropertyValue>) -> Self {
        self.prop_set.push(DynamicProperty::new(name, val));
        self
    }

    /// Value of the named property, if it was returned.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.prop_set.iter().find(|p| p.name == name).map(|p| &p.val)
    }

    /// Value of the first declared property.
    pub fn first_value(&self) -> Option<&PropertyValue> {
        self.prop_set.first().map(|p| &p.val)
    }
}

/// One page of a retrieval. A `token` means more pages remain on the
/// server and the cursor must be continued or cancelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyPage {
    #[serde(default)]
    pub objects: Vec<ObjectContent>,
    #[serde(default)]
    pub token: Option<String>,
}

impl PropertyPage {
    pub fn new(objects: Vec<ObjectContent>) -> Self {
        Self {
            objects,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Instance / interface inputs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The guest instance a payload or lookup is about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    /// Instance uuid; VMs are created with this as their name
    pub uuid: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub memory_mb: u64,
    /// Compute node, e.g. `domain-1001(MyCluster)`
    #[serde(default)]
    pub node: Option<String>,
}

/// Network the interface is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NetworkRef {
    /// NSX opaque network
    #[serde(rename_all = "camelCase")]
    OpaqueNetwork {
        network_id: String,
        network_type: String,
    },
    /// Distributed switch portgroup
    #[serde(rename_all = "camelCase")]
    DistributedVirtualPortgroup { dvs_uuid: String, portgroup_key: String },
    /// Standard portgroup, attached by name
    Network { reference: ManagedObjectRef },
}

/// Virtual interface to plug into a new VM.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VifInfo {
    pub network_name: String,
    pub mac_address: String,
    #[serde(default)]
    pub network_ref: Option<NetworkRef>,
    /// External (Neutron) port id
    #[serde(default)]
    pub iface_id: Option<String>,
    #[serde(default = "default_vif_model")]
    pub vif_model: String,
}

fn default_vif_model() -> String {
    "e1000".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Query results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VmPowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
    #[serde(other)]
    Unknown,
}

impl VmPowerState {
    /// Parse the `runtime.powerState` string.
    pub fn from_vim(s: &str) -> Self {
        match s {
            "poweredOn" => Self::PoweredOn,
            "poweredOff" => Self::PoweredOff,
            "suspended" => Self::Suspended,
            _ => Self::Unknown,
        }
    }
}

impl Default for VmPowerState {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Where to look for candidate datastores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatastoreScope {
    All,
    Cluster(ManagedObjectRef),
    Host(ManagedObjectRef),
}

/// A usable datastore picked by the full scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreSelection {
    pub datastore_ref: ManagedObjectRef,
    pub name: String,
    /// Bytes
    pub capacity: i64,
    /// Bytes
    pub free_space: i64,
}

/// Cluster / resource pool pair a configured display name resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMapping {
    pub cluster_ref: ManagedObjectRef,
    pub resource_pool_ref: ManagedObjectRef,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    /// Sum of host CPU threads
    pub vcpus: u32,
    pub cores: u32,
    pub vendor: Vec<String>,
    pub model: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemStats {
    /// MB
    pub total: i64,
    /// MB
    pub free: i64,
}

/// Aggregate capacity of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    pub cpu: CpuStats,
    pub mem: MemStats,
}
