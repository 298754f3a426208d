//! Device identities and registry entries.

use super::resource_kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key of the device representing one monitored resource.
///
/// Renders as `{scope}_{KIND}_{resource_id}`. Disk identifiers are only unique
/// per node, so disks use `{node}_{disk_id}` as their resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIdentity {
    scope: String,
    kind: ResourceKind,
    resource_id: String,
}

impl DeviceIdentity {
    pub fn new(scope: impl Into<String>, kind: ResourceKind, resource_id: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            kind,
            resource_id: resource_id.into(),
        }
    }

    pub fn node(scope: impl Into<String>, node: &str) -> Self {
        Self::new(scope, ResourceKind::Node, node)
    }

    pub fn disk(scope: impl Into<String>, node: &str, disk_id: &str) -> Self {
        Self::new(scope, ResourceKind::Disk, format!("{}_{}", node, disk_id))
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// The identity string handed to the device registry.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.scope,
            self.kind.identity_tag(),
            self.resource_id
        )
    }
}

/// Descriptive attributes applied when a device is first created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub model: Option<String>,
    /// Link into the Proxmox web console.
    pub configuration_url: Option<String>,
}

/// A device as stored by the device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Registry-assigned id.
    pub id: String,
    /// The identity the device was created for.
    pub identity: String,
    #[serde(flatten)]
    pub info: DeviceInfo,
    /// Registry id of the parent device, if linked.
    pub via_device_id: Option<String>,
}
