//! Driver configuration.

use crate::error::VsphereResult;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Settings for one vCenter / ESXi endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereDriverConfig {
    /// vCenter or ESXi hostname / IP
    pub host: String,
    /// Port (default 443)
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Skip TLS certificate verification (self-signed labs)
    #[serde(default)]
    pub insecure: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Page size for property retrievals; read by the transport implementation
    #[serde(default = "default_max_objects")]
    pub max_objects: u32,
    /// Cluster or resource pool display names this driver manages
    #[serde(default)]
    pub cluster_names: Vec<String>,
    /// Only datastores whose name matches are used for new VMs
    #[serde(default)]
    pub datastore_regex: Option<String>,
    /// Guest OS id used when the image does not name one
    #[serde(default = "default_guest_os")]
    pub guest_os: String,
}

fn default_port() -> u16 { 443 }
fn default_timeout() -> u64 { 30 }
fn default_max_objects() -> u32 { 100 }
fn default_guest_os() -> String { "otherGuest".into() }

impl Default for VsphereDriverConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
            insecure: false,
            timeout_secs: 30,
            max_objects: 100,
            cluster_names: Vec::new(),
            datastore_regex: None,
            guest_os: default_guest_os(),
        }
    }
}

impl VsphereDriverConfig {
    pub fn from_json(json: &str) -> VsphereResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compile `datastore_regex`, if set.
    pub fn datastore_pattern(&self) -> VsphereResult<Option<Regex>> {
        match self.datastore_regex.as_deref() {
            Some(p) if !p.is_empty() => Ok(Some(Regex::new(p)?)),
            _ => Ok(None),
        }
    }

    /// Configured cluster names, trimmed, blanks dropped.
    pub fn cluster_names(&self) -> Vec<&str> {
        self.cluster_names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VsphereErrorKind;

    #[test]
    fn defaults_applied() {
        let cfg = VsphereDriverConfig::from_json(
            r#"{"host":"vc.lab.local","username":"admin","password":"secret"}"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 443);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_objects, 100);
        assert_eq!(cfg.guest_os, "otherGuest");
        assert!(!cfg.insecure);
        assert!(cfg.datastore_pattern().unwrap().is_none());
    }

    #[test]
    fn regex_compiled() {
        let cfg = VsphereDriverConfig {
            datastore_regex: Some("^ssd-.*".into()),
            ..Default::default()
        };
        let re = cfg.datastore_pattern().unwrap().unwrap();
        assert!(re.is_match("ssd-01"));
    }

    #[test]
    fn bad_regex_is_config_error() {
        let cfg = VsphereDriverConfig {
            datastore_regex: Some("([".into()),
            ..Default::default()
        };
        let err = cfg.datastore_pattern().unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::InvalidConfig);
    }

    #[test]
    fn bad_json_is_config_error() {
        let err = VsphereDriverConfig::from_json("{").unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::InvalidConfig);
    }

    #[test]
    fn cluster_names_trimmed() {
        let cfg = VsphereDriverConfig {
            cluster_names: vec![" Cluster1 ".into(), "".into(), "Pool2".into()],
            ..Default::default()
        };
        assert_eq!(cfg.cluster_names(), vec!["Cluster1", "Pool2"]);
    }
}
