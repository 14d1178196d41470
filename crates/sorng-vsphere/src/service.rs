//! Aggregate driver façade.
//!
//! `VsphereDriver` owns the transport and the configuration and exposes the
//! configured lookups. Shared handles use
//! `VsphereDriverState<T> = Arc<Mutex<VsphereDriver<T>>>`.

use crate::builder;
use crate::config::VsphereDriverConfig;
use crate::error::VsphereResult;
use crate::queries::{mo_id_from_node, VimQueries};
use crate::spec::ConfigSpec;
use crate::transport::VimTransport;
use crate::types::*;

use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe handle.
pub type VsphereDriverState<T> = Arc<Mutex<VsphereDriver<T>>>;

pub struct VsphereDriver<T: VimTransport> {
    transport: T,
    config: VsphereDriverConfig,
    datastore_regex: Option<Regex>,
}

impl<T: VimTransport> VsphereDriver<T> {
    /// Fails when the configured datastore regex does not compile.
    pub fn new(transport: T, config: VsphereDriverConfig) -> VsphereResult<Self> {
        let datastore_regex = config.datastore_pattern()?;
        log::info!(
            "vSphere driver for {}:{} ({} cluster name(s))",
            config.host,
            config.port,
            config.cluster_names().len()
        );
        Ok(Self {
            transport,
            config,
            datastore_regex,
        })
    }

    pub fn into_state(self) -> VsphereDriverState<T> {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &VsphereDriverConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn queries(&self) -> VimQueries<'_, T> {
        VimQueries::new(&self.transport)
    }

    // ── Lookups ─────────────────────────────────────────────────────

    pub async fn resolve_vm(&self, instance: &InstanceInfo) -> VsphereResult<ManagedObjectRef> {
        self.queries().vm_ref(instance).await
    }

    /// Datastore for new VMs, filtered by the configured regex.
    pub async fn select_datastore(&self, scope: &DatastoreScope) -> VsphereResult<DatastoreSelection> {
        self.queries()
            .datastore_ref_and_name(scope, self.datastore_regex.as_ref())
            .await
    }

    /// Clusters and resource pools named in the configuration.
    pub async fn cluster_mapping(&self) -> VsphereResult<HashMap<String, ClusterMapping>> {
        let names = self.config.cluster_names();
        if names.is_empty() {
            return Ok(HashMap::new());
        }
        self.queries().all_cluster_refs_by_name(&names).await
    }

    pub async fn cluster_stats(&self, cluster: &ManagedObjectRef) -> VsphereResult<ClusterStats> {
        self.queries().cluster_stats(cluster).await
    }

    /// Resource pool for the instance's compute node within `cluster`.
    pub async fn resource_pool_for(
        &self,
        instance: &InstanceInfo,
        cluster: Option<&ManagedObjectRef>,
    ) -> VsphereResult<ManagedObjectRef> {
        let node = instance.node.as_deref().map(mo_id_from_node).unwrap_or_default();
        self.queries().res_pool_ref(cluster, node).await
    }

    // ── Payloads ────────────────────────────────────────────────────

    /// Create spec using the configured guest OS unless one is given.
    pub fn create_spec(
        &self,
        instance: &InstanceInfo,
        datastore_name: &str,
        vifs: &[VifInfo],
        guest_id: Option<&str>,
    ) -> ConfigSpec {
        let guest_id = guest_id.unwrap_or(&self.config.guest_os);
        builder::vm_create_spec(instance, datastore_name, vifs, Some(guest_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VsphereErrorKind;
    use crate::transport::MockVimTransport;

    fn config() -> VsphereDriverConfig {
        VsphereDriverConfig {
            host: "vc.lab.local".into(),
            datastore_regex: Some("^gold".into()),
            cluster_names: vec!["Cluster1".into()],
            guest_os: "ubuntu64Guest".into(),
            ..Default::default()
        }
    }

    fn instance() -> InstanceInfo {
        InstanceInfo {
            uuid: "uuid-1".into(),
            name: "web-1".into(),
            vcpus: 1,
            memory_mb: 256,
            node: Some("domain-c7(Cluster1)".into()),
        }
    }

    #[test]
    fn bad_regex_rejected() {
        let cfg = VsphereDriverConfig {
            datastore_regex: Some("(".into()),
            ..Default::default()
        };
        let err = VsphereDriver::new(MockVimTransport::new(), cfg).err().unwrap();
        assert_eq!(err.kind, VsphereErrorKind::InvalidConfig);
    }

    #[test]
    fn create_spec_uses_configured_guest() {
        let driver = VsphereDriver::new(MockVimTransport::new(), config()).unwrap();
        let spec = driver.create_spec(&instance(), "gold-1", &[], None);
        assert_eq!(spec.guest_id.as_deref(), Some("ubuntu64Guest"));
        let spec = driver.create_spec(&instance(), "gold-1", &[], Some("vmkernel5Guest"));
        assert_eq!(spec.nested_hv_enabled, Some(true));
    }

    #[tokio::test]
    async fn datastore_uses_configured_regex() {
        let mut transport = MockVimTransport::new();
        transport.expect_retrieve_objects().returning(|_, _| {
            let ds = |value: &str, name: &str| {
                ObjectContent::new(ManagedObjectRef::of(ObjectType::Datastore, value))
                    .with_property("summary.type", "VMFS")
                    .with_property("summary.name", name)
                    .with_property("summary.capacity", 100_i64)
                    .with_property("summary.freeSpace", 50_i64)
                    .with_property("summary.accessible", true)
            };
            Ok(PropertyPage::new(vec![ds("datastore-1", "silver-1"), ds("datastore-2", "gold-1")]))
        });

        let driver = VsphereDriver::new(transport, config()).unwrap();
        let sel = driver.select_datastore(&DatastoreScope::All).await.unwrap();
        assert_eq!(sel.name, "gold-1");
    }

    #[tokio::test]
    async fn resource_pool_from_node() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_get_dynamic_property()
            .withf(|obj, _, name| obj.value == "domain-c7" && name == "resourcePool")
            .times(1)
            .returning(|_, _, _| Ok(Some(ManagedObjectRef::of(ObjectType::ResourcePool, "resgroup-8").into())));

        let driver = VsphereDriver::new(transport, config()).unwrap();
        let cluster = ManagedObjectRef::of(ObjectType::ClusterComputeResource, "domain-c7");
        let pool = driver.resource_pool_for(&instance(), Some(&cluster)).await.unwrap();
        assert_eq!(pool.value, "resgroup-8");
    }

    #[tokio::test]
    async fn no_cluster_names_skips_lookup() {
        let transport = MockVimTransport::new();
        let driver = VsphereDriver::new(
            transport,
            VsphereDriverConfig {
                cluster_names: vec!["  ".into()],
                ..Default::default()
            },
        )
        .unwrap();
        assert!(driver.cluster_mapping().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shared_state_handle() {
        let state = VsphereDriver::new(MockVimTransport::new(), config())
            .unwrap()
            .into_state();
        let guard = state.lock().await;
        assert_eq!(guard.config().host, "vc.lab.local");
    }
}
