//! Domain models for cluster-wide resources.
//!
//! This module defines the structures returned by the `/cluster/resources` endpoint.
//! The response contains a heterogeneous list of resources (VMs, containers, storage, etc.),
//! each identified by a `type` field. We model this as an enum to provide type safety.

use crate::core::domain::value_object::serde_helpers::{lenient_f64, lenient_string, lenient_u32, lenient_u64};
use serde::{Deserialize, Serialize};

/// A resource discovered in the Proxmox cluster.
///
/// The `type` field determines which variant this is. Types the monitor does not
/// track (`pool`, `sdn`, ...) deserialize to [`ClusterResource::Other`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClusterResource {
    /// A QEMU virtual machine.
    Qemu(GuestResource),
    /// An LXC container.
    Lxc(GuestResource),
    /// A storage entity.
    Storage(StorageResource),
    /// A node in the cluster.
    Node(NodeResource),
    /// Any resource type the monitor ignores.
    #[serde(other)]
    Other,
}

impl ClusterResource {
    /// Node the resource lives on, if reported.
    pub fn node(&self) -> Option<&str> {
        match self {
            ClusterResource::Qemu(r) | ClusterResource::Lxc(r) => r.common.node.as_deref(),
            ClusterResource::Storage(r) => r.common.node.as_deref(),
            ClusterResource::Node(r) => r.common.node.as_deref(),
            ClusterResource::Other => None,
        }
    }

    /// Reads one entry of a listing; entries of an unusable shape yield `None`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// Common fields present in every resource.
///
/// These are extracted into a separate struct to avoid duplication.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CommonResourceFields {
    /// The Proxmox node where this resource resides.
    #[serde(default, deserialize_with = "lenient_string")]
    pub node: Option<String>,
    /// Unique resource identifier (e.g., `qemu/100`, `storage/pve1/local`).
    #[serde(default)]
    pub id: String,
    /// Human-readable name (may be absent).
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Resource status (e.g., `running`, `stopped`, `available`, `online`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    /// Uptime in seconds (if applicable).
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

/// A virtual machine or container resource.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuestResource {
    /// Common fields.
    #[serde(flatten)]
    pub common: CommonResourceFields,
    /// The guest identifier (unique per cluster).
    #[serde(default, deserialize_with = "lenient_u32")]
    pub vmid: Option<u32>,
}

/// A storage resource (e.g., directory, ZFS, LVM).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageResource {
    /// Common fields.
    #[serde(flatten)]
    pub common: CommonResourceFields,
    /// Storage name (e.g., `local`, `nfs-storage`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub storage: Option<String>,
    /// Storage plugin type (e.g., `dir`, `zfspool`, `lvm`).
    #[serde(default, rename = "plugintype", deserialize_with = "lenient_string")]
    pub storage_type: Option<String>,
    /// Total capacity in bytes.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub maxdisk: Option<u64>,
    /// Used space in bytes.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// Comma separated content types (`images,rootdir`).
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StorageResource {
    /// Storage name, falling back to the last segment of the id.
    pub fn storage_name(&self) -> &str {
        match &self.storage {
            Some(name) => name,
            None => self.common.id.rsplit('/').next().unwrap_or_default(),
        }
    }
}

/// A node resource (the node itself).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeResource {
    /// Common fields.
    #[serde(flatten)]
    pub common: CommonResourceFields,
    /// Node CPU usage fraction.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classifies_by_type() {
        let qemu = ClusterResource::from_value(json!({
            "type": "qemu", "id": "qemu/101", "node": "pve1", "vmid": 101,
            "name": "web", "status": "running"
        }))
        .unwrap();
        match qemu {
            ClusterResource::Qemu(ref guest) => {
                assert_eq!(guest.vmid, Some(101));
                assert_eq!(guest.common.name.as_deref(), Some("web"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(qemu.node(), Some("pve1"));

        let pool = ClusterResource::from_value(json!({"type": "pool", "id": "/pool/x"})).unwrap();
        assert_eq!(pool, ClusterResource::Other);
    }

    #[test]
    fn test_storage_name_fallback() {
        let storage = ClusterResource::from_value(json!({
            "type": "storage", "id": "storage/pve1/local", "node": "pve1",
            "content": "iso,vztmpl", "maxdisk": "1000", "disk": 10
        }))
        .unwrap();
        match storage {
            ClusterResource::Storage(s) => {
                assert_eq!(s.storage_name(), "local");
                assert_eq!(s.maxdisk, Some(1000));
                assert_eq!(s.content.as_deref(), Some("iso,vztmpl"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unusable_entry() {
        assert!(ClusterResource::from_value(json!("not an object")).is_none());
        assert!(ClusterResource::from_value(json!({"id": "qemu/1"})).is_none());
    }
}
