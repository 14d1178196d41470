//! The property-collector transport seam.
//!
//! The SOAP session, serialization and retries live outside this crate;
//! everything here only sees the calls below. Pages carrying a token hold
//! server-side state until they are continued to the end or cancelled.

use crate::error::VsphereResult;
use crate::types::*;

use async_trait::async_trait;

/// Remote calls the resolver and queries are built on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VimTransport: Send + Sync {
    /// Start a retrieval of every object of `object_type` with `properties`.
    async fn retrieve_objects(
        &self,
        object_type: ObjectType,
        properties: &[String],
    ) -> VsphereResult<PropertyPage>;

    /// Read one property of one object; `None` when it is unset.
    async fn get_dynamic_property(
        &self,
        obj: &ManagedObjectRef,
        object_type: ObjectType,
        name: &str,
    ) -> VsphereResult<Option<PropertyValue>>;

    /// Read several properties of one object.
    async fn get_dynamic_properties(
        &self,
        obj: &ManagedObjectRef,
        object_type: ObjectType,
        names: &[String],
    ) -> VsphereResult<Vec<DynamicProperty>>;

    /// Start a retrieval over an explicit set of objects.
    async fn get_properties_for_objects(
        &self,
        object_type: ObjectType,
        objects: &[ManagedObjectRef],
        properties: &[String],
    ) -> VsphereResult<PropertyPage>;

    /// Fetch the page after `token`. The token is consumed.
    async fn continue_retrieval(&self, token: &str) -> VsphereResult<PropertyPage>;

    /// Release the server-side state behind `token`.
    async fn cancel_retrieval(&self, token: &str) -> VsphereResult<()>;

    /// Retrieve through a specific property collector, or the default one.
    async fn get_object_properties(
        &self,
        collector: Option<ManagedObjectRef>,
        obj: &ManagedObjectRef,
        object_type: ObjectType,
        properties: &[String],
    ) -> VsphereResult<PropertyPage>;
}

/// Owned property-name list for the transport calls.
pub(crate) fn props(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
