//! Error types for the vSphere driver core.

use crate::types::ObjectType;
use thiserror::Error;

/// Categorised error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VsphereErrorKind {
    /// Keyed lookup of a managed object found nothing
    NotFound(ObjectType),
    /// No datastore passed the selection filter
    DatastoreNotFound,
    /// A property the protocol guarantees was absent
    ImpossibleState,
    /// Raised by the transport, passed through untouched
    TransportFailure,
    /// Text was not a `[datastore] path`
    InvalidDatastorePath,
    /// Configuration could not be parsed or compiled
    InvalidConfig,
}

/// Crate error type carrying a kind, a human-readable message and the
/// lookup key (uuid, host id, datastore pattern) when there is one.
#[derive(Debug, Clone, Error)]
#[error("[{kind:?}] {message}")]
pub struct VsphereError {
    pub kind: VsphereErrorKind,
    pub message: String,
    pub key: Option<String>,
}

impl VsphereError {
    pub fn new(kind: VsphereErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn not_found(object_type: ObjectType, key: impl Into<String>) -> Self {
        let key = key.into();
        let message = match object_type {
            ObjectType::VirtualMachine => format!("Instance {key} could not be found"),
            other => format!("{other} {key} could not be found"),
        };
        Self::new(VsphereErrorKind::NotFound(object_type), message).with_key(key)
    }

    pub fn datastore_not_found(pattern: Option<&str>) -> Self {
        match pattern {
            Some(p) => Self::new(
                VsphereErrorKind::DatastoreNotFound,
                format!("Datastore regex {p} did not match any datastores"),
            )
            .with_key(p),
            None => Self::new(VsphereErrorKind::DatastoreNotFound, "Datastore not found"),
        }
    }

    pub fn impossible_state(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::ImpossibleState, msg)
    }

    pub fn transport(operation: &str, msg: impl Into<String>) -> Self {
        Self::new(
            VsphereErrorKind::TransportFailure,
            format!("{operation}: {}", msg.into()),
        )
    }

    pub fn invalid_path(text: &str) -> Self {
        Self::new(
            VsphereErrorKind::InvalidDatastorePath,
            format!("'{text}' is not a datastore path"),
        )
        .with_key(text)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::InvalidConfig, msg)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            VsphereErrorKind::NotFound(_) | VsphereErrorKind::DatastoreNotFound
        )
    }
}

impl From<VsphereError> for String {
    fn from(e: VsphereError) -> String {
        e.to_string()
    }
}

impl From<serde_json::Error> for VsphereError {
    fn from(e: serde_json::Error) -> Self {
        Self::config(format!("JSON parse error: {e}"))
    }
}

impl From<regex::Error> for VsphereError {
    fn from(e: regex::Error) -> Self {
        Self::config(format!("Invalid datastore regex: {e}"))
    }
}

/// Convenience alias.
pub type VsphereResult<T> = Result<T, VsphereError>;
