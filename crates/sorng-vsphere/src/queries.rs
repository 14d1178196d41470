//! Managed-object lookups built on the resolver.
//!
//! VMs by uuid or name, the host a VM runs on, datastore selection,
//! cluster / resource pool mapping and cluster capacity.

use crate::error::{VsphereError, VsphereResult};
use crate::resolver::{self, ObjectMatch, PropertyCursor, DATASTORE_PROPERTIES};
use crate::transport::{props, VimTransport};
use crate::types::*;

use regex::Regex;
use std::collections::HashMap;

const BYTES_PER_MB: i64 = 1024 * 1024;

/// Lookups against one transport.
pub struct VimQueries<'a, T: VimTransport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: VimTransport + ?Sized> VimQueries<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    async fn find(
        &self,
        object_type: ObjectType,
        properties: &[&str],
        target: ObjectMatch<'_>,
    ) -> VsphereResult<Option<ObjectContent>> {
        let page = self
            .transport
            .retrieve_objects(object_type, &props(properties))
            .await?;
        resolver::find_first_by(self.transport, page, target).await
    }

    /// Objects of the first page only; the rest of the retrieval is
    /// cancelled.
    async fn first_object(&self, object_type: ObjectType) -> VsphereResult<Option<ObjectContent>> {
        let mut cursor =
            PropertyCursor::retrieve(self.transport, object_type, &props(&["name"])).await?;
        let first = cursor.objects().first().cloned();
        cursor.finish(Ok(first)).await
    }

    // ── Virtual machines ────────────────────────────────────────────

    /// VMs are created with the instance uuid as their name.
    pub async fn vm_ref_from_uuid(&self, uuid: &str) -> VsphereResult<Option<ManagedObjectRef>> {
        Ok(self
            .find(ObjectType::VirtualMachine, &["name"], ObjectMatch::FirstProperty(uuid))
            .await?
            .map(|o| o.obj))
    }

    pub async fn vm_ref_from_name(&self, name: &str) -> VsphereResult<Option<ManagedObjectRef>> {
        Ok(self
            .find(ObjectType::VirtualMachine, &["name"], ObjectMatch::FirstProperty(name))
            .await?
            .map(|o| o.obj))
    }

    /// Reference of the instance's VM, by uuid first and display name second.
    pub async fn vm_ref(&self, instance: &InstanceInfo) -> VsphereResult<ManagedObjectRef> {
        if let Some(vm) = self.vm_ref_from_uuid(&instance.uuid).await? {
            return Ok(vm);
        }
        match self.vm_ref_from_name(&instance.name).await? {
            Some(vm) => {
                log::info!("Found VM for instance {} by name '{}'", instance.uuid, instance.name);
                Ok(vm)
            }
            None => Err(VsphereError::not_found(ObjectType::VirtualMachine, &instance.uuid)),
        }
    }

    pub async fn vm_power_state(&self, vm_name: &str) -> VsphereResult<VmPowerState> {
        let vm = self
            .vm_ref_from_name(vm_name)
            .await?
            .ok_or_else(|| VsphereError::not_found(ObjectType::VirtualMachine, vm_name))?;
        let state = self
            .transport
            .get_dynamic_property(&vm, ObjectType::VirtualMachine, "runtime.powerState")
            .await?;
        Ok(state
            .as_ref()
            .and_then(PropertyValue::as_str)
            .map(VmPowerState::from_vim)
            .unwrap_or_default())
    }

    // ── Hosts ───────────────────────────────────────────────────────

    /// Host whose reference value is `host_id`, with `properties`
    /// (default `name`).
    pub async fn host_ref_from_id(
        &self,
        host_id: &str,
        properties: Option<&[&str]>,
    ) -> VsphereResult<Option<ObjectContent>> {
        self.find(
            ObjectType::HostSystem,
            properties.unwrap_or(&["name"]),
            ObjectMatch::Reference(host_id),
        )
        .await
    }

    /// Reference value of the host running `vm`. vMotion moves VMs, so
    /// this must not be cached.
    pub async fn host_id_from_vm_ref(&self, vm: &ManagedObjectRef) -> VsphereResult<String> {
        let page = self
            .transport
            .get_object_properties(None, vm, ObjectType::VirtualMachine, &props(&["runtime.host"]))
            .await?;
        resolver::full_scan(self.transport, page, |obj| {
            Ok(obj
                .property("runtime.host")
                .and_then(PropertyValue::as_mor)
                .map(|host| host.value.clone()))
        })
        .await?
        .ok_or_else(|| {
            VsphereError::impossible_state(format!("Virtual machine {vm} exists without a runtime.host"))
        })
    }

    pub async fn host_ref_for_vm(
        &self,
        instance: &InstanceInfo,
        properties: Option<&[&str]>,
    ) -> VsphereResult<Option<ObjectContent>> {
        let vm = self.vm_ref(instance).await?;
        let host_id = self.host_id_from_vm_ref(&vm).await?;
        self.host_ref_from_id(&host_id, properties).await
    }

    pub async fn host_name_for_vm(&self, instance: &InstanceInfo) -> VsphereResult<Option<String>> {
        let host = self.host_ref_for_vm(instance, Some(&["name"])).await?;
        Ok(host.as_ref().and_then(host_name_from_host_ref))
    }

    /// A host in `cluster`, or the first host of the inventory.
    pub async fn host_ref(&self, cluster: Option<&ManagedObjectRef>) -> VsphereResult<Option<ManagedObjectRef>> {
        match cluster {
            None => Ok(self.first_object(ObjectType::HostSystem).await?.map(|o| o.obj)),
            Some(cluster) => {
                let hosts = self
                    .transport
                    .get_dynamic_property(cluster, ObjectType::ClusterComputeResource, "host")
                    .await?;
                Ok(hosts
                    .as_ref()
                    .and_then(PropertyValue::as_mor_array)
                    .and_then(|hosts| hosts.first().cloned()))
            }
        }
    }

    // ── Clusters / resource pools ───────────────────────────────────

    pub async fn cluster_ref_from_name(&self, name: &str) -> VsphereResult<Option<ManagedObjectRef>> {
        Ok(self
            .find(ObjectType::ClusterComputeResource, &["name"], ObjectMatch::FirstProperty(name))
            .await?
            .map(|o| o.obj))
    }

    /// Resource pool to place a VM for compute node `node_mo_id`.
    ///
    /// No cluster: the root pool, which is always listed first. The
    /// cluster itself as the node: its root pool. Otherwise the node is a
    /// resource pool.
    pub async fn res_pool_ref(
        &self,
        cluster: Option<&ManagedObjectRef>,
        node_mo_id: &str,
    ) -> VsphereResult<ManagedObjectRef> {
        match cluster {
            None => self
                .first_object(ObjectType::ResourcePool)
                .await?
                .map(|o| o.obj)
                .ok_or_else(|| VsphereError::impossible_state("Inventory has no root resource pool")),
            Some(cluster) if cluster.value == node_mo_id => {
                let pool = self
                    .transport
                    .get_dynamic_property(cluster, ObjectType::ClusterComputeResource, "resourcePool")
                    .await?;
                pool.as_ref()
                    .and_then(PropertyValue::as_mor)
                    .cloned()
                    .ok_or_else(|| {
                        VsphereError::impossible_state(format!("Cluster {cluster} has no resourcePool"))
                    })
            }
            Some(_) => Ok(ManagedObjectRef::of(ObjectType::ResourcePool, node_mo_id)),
        }
    }

    async fn all_named(&self, object_type: ObjectType) -> Vec<ObjectContent> {
        let listed = async {
            let page = self
                .transport
                .retrieve_objects(object_type, &props(&["name"]))
                .await?;
            resolver::collect_all(self.transport, page).await
        };
        match listed.await {
            Ok(objects) => objects,
            Err(e) => {
                log::warn!("Failed to get {} references: {}", object_type, e);
                Vec::new()
            }
        }
    }

    /// Every cluster with its name. Failures are logged and yield nothing.
    pub async fn all_cluster_mors(&self) -> Vec<ObjectContent> {
        self.all_named(ObjectType::ClusterComputeResource).await
    }

    /// Every resource pool with its name. Failures are logged and yield
    /// nothing.
    pub async fn all_res_pool_mors(&self) -> Vec<ObjectContent> {
        self.all_named(ObjectType::ResourcePool).await
    }

    /// Single property of any known object.
    pub async fn dynamic_property_mor(
        &self,
        mor: &ManagedObjectRef,
        attribute: &str,
    ) -> VsphereResult<Option<PropertyValue>> {
        let object_type: ObjectType = mor
            .kind
            .parse()
            .map_err(|e: String| VsphereError::impossible_state(e))?;
        self.transport
            .get_dynamic_property(mor, object_type, attribute)
            .await
    }

    /// Map configured display names to cluster / resource pool pairs,
    /// keyed by the matched object's reference value.
    pub async fn all_cluster_refs_by_name(
        &self,
        names: &[&str],
    ) -> VsphereResult<HashMap<String, ClusterMapping>> {
        let clusters = self.all_cluster_mors().await;
        if clusters.is_empty() {
            return Ok(HashMap::new());
        }
        let pools = self.all_res_pool_mors().await;
        if pools.is_empty() {
            return Ok(HashMap::new());
        }

        let mut matched = Vec::new();
        for name in names.iter().map(|n| n.trim()) {
            for obj in find_entity_mor(&clusters, name)
                .into_iter()
                .chain(find_entity_mor(&pools, name))
            {
                matched.push((obj.obj.clone(), name.to_string()));
            }
        }
        self.dict_mor(&matched).await
    }

    /// Pair each cluster with its root pool and each pool with its owner.
    pub async fn dict_mor(
        &self,
        objects: &[(ManagedObjectRef, String)],
    ) -> VsphereResult<HashMap<String, ClusterMapping>> {
        let mut mapping = HashMap::new();
        for (obj, name) in objects {
            let (cluster_ref, resource_pool_ref) = if obj.is(ObjectType::ResourcePool) {
                (self.related(obj, "owner").await?, obj.clone())
            } else {
                (obj.clone(), self.related(obj, "resourcePool").await?)
            };
            mapping.insert(
                obj.value.clone(),
                ClusterMapping {
                    cluster_ref,
                    resource_pool_ref,
                    name: name.clone(),
                },
            );
        }
        Ok(mapping)
    }

    async fn related(&self, obj: &ManagedObjectRef, attribute: &str) -> VsphereResult<ManagedObjectRef> {
        self.dynamic_property_mor(obj, attribute)
            .await?
            .as_ref()
            .and_then(PropertyValue::as_mor)
            .cloned()
            .ok_or_else(|| VsphereError::impossible_state(format!("{obj} has no {attribute}")))
    }

    /// Summed host CPU and resource-pool memory of a cluster.
    pub async fn cluster_stats(&self, cluster: &ManagedObjectRef) -> VsphereResult<ClusterStats> {
        let mut stats = ClusterStats::default();
        let properties = self
            .transport
            .get_dynamic_properties(
                cluster,
                ObjectType::ClusterComputeResource,
                &props(&["host", "resourcePool"]),
            )
            .await?;
        let find = |name: &str| properties.iter().find(|p| p.name == name).map(|p| &p.val);

        if let Some(hosts) = find("host").and_then(PropertyValue::as_mor_array) {
            if !hosts.is_empty() {
                let page = self
                    .transport
                    .get_properties_for_objects(
                        ObjectType::HostSystem,
                        hosts,
                        &props(&["summary.hardware"]),
                    )
                    .await?;
                for host in resolver::collect_all(self.transport, page).await? {
                    if let Some(hw) = host.first_value().and_then(PropertyValue::as_host_hardware) {
                        // vcpus counts physical threads; overcommit is the scheduler's concern
                        stats.cpu.vcpus += hw.num_cpu_threads;
                        stats.cpu.cores += hw.num_cpu_cores;
                        stats.cpu.vendor.push(hw.vendor.clone());
                        stats.cpu.model.push(hw.cpu_model.clone());
                    }
                }
            }
        }

        if let Some(pool) = find("resourcePool").and_then(PropertyValue::as_mor) {
            let usage = self
                .transport
                .get_dynamic_property(pool, ObjectType::ResourcePool, "summary.runtime.memory")
                .await?;
            if let Some(usage) = usage.as_ref().and_then(PropertyValue::as_memory_usage) {
                stats.mem.total = usage.max_usage / BYTES_PER_MB;
                stats.mem.free = stats.mem.total - usage.overall_usage / BYTES_PER_MB;
            }
        }

        log::debug!(
            "Cluster {}: {} vcpus, {} MB total, {} MB free",
            cluster,
            stats.cpu.vcpus,
            stats.mem.total,
            stats.mem.free
        );
        Ok(stats)
    }

    // ── Datastores ──────────────────────────────────────────────────

    /// First accessible VMFS / NFS datastore in `scope` whose name matches
    /// `pattern`.
    pub async fn datastore_ref_and_name(
        &self,
        scope: &DatastoreScope,
        pattern: Option<&Regex>,
    ) -> VsphereResult<DatastoreSelection> {
        let properties = props(&DATASTORE_PROPERTIES);
        let page = match scope {
            DatastoreScope::All => {
                self.transport
                    .retrieve_objects(ObjectType::Datastore, &properties)
                    .await?
            }
            DatastoreScope::Cluster(owner) | DatastoreScope::Host(owner) => {
                let owner_type = match scope {
                    DatastoreScope::Cluster(_) => ObjectType::ClusterComputeResource,
                    _ => ObjectType::HostSystem,
                };
                let datastores = self
                    .transport
                    .get_dynamic_property(owner, owner_type, "datastore")
                    .await?
                    .ok_or_else(|| VsphereError::datastore_not_found(None))?;
                let refs = datastores.as_mor_array().unwrap_or_default();
                self.transport
                    .get_properties_for_objects(ObjectType::Datastore, refs, &properties)
                    .await?
            }
        };

        let selected = resolver::select_datastore(self.transport, page, pattern).await?;
        log::info!(
            "Selected datastore {} ({})",
            selected.name,
            selected.datastore_ref.value
        );
        Ok(selected)
    }
}

/// `name` of a host result, if it was requested.
pub fn host_name_from_host_ref(host: &ObjectContent) -> Option<String> {
    host.property("name")
        .and_then(PropertyValue::as_str)
        .map(str::to_owned)
}

/// Objects whose first property equals `name`.
pub fn find_entity_mor<'o>(objects: &'o [ObjectContent], name: &str) -> Vec<&'o ObjectContent> {
    objects
        .iter()
        .filter(|o| o.first_value().and_then(PropertyValue::as_str) == Some(name))
        .collect()
}

/// Managed object id from a compute node name such as
/// `domain-1001(MyCluster)`.
pub fn mo_id_from_node(node: &str) -> &str {
    node.split_once('(').map_or(node, |(id, _)| id)
}
