//! `[datastore] relative/path` notation.
//!
//! No escaping: a `]` inside the datastore name or a `[` inside the path is
//! not supported.

use crate::error::VsphereError;

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatastorePath {
    pub datastore_name: String,
    pub relative_path: String,
}

impl DatastorePath {
    pub fn new(datastore_name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            datastore_name: datastore_name.into(),
            relative_path: relative_path.into(),
        }
    }
}

impl fmt::Display for DatastorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.datastore_name, self.relative_path)
    }
}

impl FromStr for DatastorePath {
    type Err = VsphereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split_datastore_path(s).ok_or_else(|| VsphereError::invalid_path(s))
    }
}

/// `"[<name>] <path>"`
pub fn build_datastore_path(datastore_name: &str, path: &str) -> String {
    format!("[{datastore_name}] {path}")
}

/// Split text at the first `[` and the first `]` after it.
///
/// Returns `None` when there is no `[`. Without a closing `]` the rest of
/// the text is taken as the datastore name and the path is empty.
pub fn split_datastore_path(text: &str) -> Option<DatastorePath> {
    let (_, rest) = text.split_once('[')?;
    Some(match rest.split_once(']') {
        Some((name, path)) => DatastorePath::new(name, path.trim()),
        None => DatastorePath::new(rest, ""),
    })
}
