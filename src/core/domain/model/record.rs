//! Typed snapshots produced by one refresh cycle of a coordinator.
//!
//! Every optional metric is a [`Field`]: an upstream omission stays `Absent`
//! and is never folded into zero by the ratio helpers below.

use super::disk::DiskType;
use super::field::{Field, difference, percentage};
use super::resource_kind::ResourceKind;
use serde::{Deserialize, Serialize};

/// Status reported for a node the node list does not show as online.
pub const NODE_OFFLINE: &str = "offline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node: String,
    pub status: Field<String>,
    /// CPU model string.
    pub model: Field<String>,
    /// Proxmox VE version.
    pub version: Field<String>,
    pub uptime: Field<u64>,
    /// CPU usage fraction (0.0 to 1.0).
    pub cpu: Field<f64>,
    pub disk_total: Field<u64>,
    pub disk_used: Field<u64>,
    pub memory_total: Field<u64>,
    pub memory_used: Field<u64>,
    pub memory_free: Field<u64>,
    pub swap_total: Field<u64>,
    pub swap_used: Field<u64>,
    pub swap_free: Field<u64>,
    /// Number of running virtual machines.
    pub qemu_on: u32,
    /// Running virtual machines as `"{name} ({vmid})"`.
    pub qemu_on_list: Field<Vec<String>>,
    /// Number of running containers.
    pub lxc_on: u32,
    pub lxc_on_list: Field<Vec<String>>,
}

impl NodeRecord {
    /// Record of a node that is not online: no detail endpoint was called.
    pub fn offline(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            status: Field::Value(NODE_OFFLINE.to_string()),
            model: Field::Absent,
            version: Field::Absent,
            uptime: Field::Absent,
            cpu: Field::Absent,
            disk_total: Field::Absent,
            disk_used: Field::Absent,
            memory_total: Field::Absent,
            memory_used: Field::Absent,
            memory_free: Field::Absent,
            swap_total: Field::Absent,
            swap_used: Field::Absent,
            swap_free: Field::Absent,
            qemu_on: 0,
            qemu_on_list: Field::Absent,
            lxc_on: 0,
            lxc_on_list: Field::Absent,
        }
    }

    pub fn memory_used_percentage(&self) -> Field<f64> {
        percentage(&self.memory_used, &self.memory_total)
    }

    pub fn swap_used_percentage(&self) -> Field<f64> {
        percentage(&self.swap_used, &self.swap_total)
    }

    pub fn disk_used_percentage(&self) -> Field<f64> {
        percentage(&self.disk_used, &self.disk_total)
    }
}

/// A QEMU virtual machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    pub vmid: u32,
    /// Node hosting the VM during this cycle.
    pub node: String,
    pub name: Field<String>,
    pub status: Field<String>,
    /// QEMU monitor status.
    pub health: Field<String>,
    pub uptime: Field<u64>,
    pub cpu: Field<f64>,
    pub memory_total: Field<u64>,
    pub memory_used: Field<u64>,
    pub memory_free: Field<u64>,
    pub network_in: Field<u64>,
    pub network_out: Field<u64>,
    pub disk_total: Field<u64>,
    pub disk_used: Field<u64>,
}

impl VmRecord {
    pub fn memory_used_percentage(&self) -> Field<f64> {
        percentage(&self.memory_used, &self.memory_total)
    }

    pub fn disk_used_percentage(&self) -> Field<f64> {
        percentage(&self.disk_used, &self.disk_total)
    }
}

/// An LXC container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LxcRecord {
    pub vmid: u32,
    pub node: String,
    pub name: Field<String>,
    pub status: Field<String>,
    pub uptime: Field<u64>,
    pub cpu: Field<f64>,
    pub memory_total: Field<u64>,
    pub memory_used: Field<u64>,
    pub memory_free: Field<u64>,
    pub network_in: Field<u64>,
    pub network_out: Field<u64>,
    pub disk_total: Field<u64>,
    pub disk_used: Field<u64>,
    pub swap_total: Field<u64>,
    pub swap_used: Field<u64>,
    pub swap_free: Field<u64>,
}

impl LxcRecord {
    pub fn memory_used_percentage(&self) -> Field<f64> {
        percentage(&self.memory_used, &self.memory_total)
    }

    pub fn swap_used_percentage(&self) -> Field<f64> {
        percentage(&self.swap_used, &self.swap_total)
    }

    pub fn disk_used_percentage(&self) -> Field<f64> {
        percentage(&self.disk_used, &self.disk_total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    /// Cluster resource id, e.g. `storage/pve1/local`.
    pub storage_id: String,
    pub node: Option<String>,
    /// `"Storage {node}/{name}"` style display name.
    pub name: String,
    pub disk_total: Field<u64>,
    pub disk_used: Field<u64>,
    /// Comma separated content types.
    pub content: Field<String>,
}

impl StorageRecord {
    pub fn disk_free(&self) -> Field<u64> {
        difference(&self.disk_total, &self.disk_used)
    }

    pub fn disk_used_percentage(&self) -> Field<f64> {
        percentage(&self.disk_used, &self.disk_total)
    }
}

/// Pending package updates of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub node: String,
    /// Always the length of `updates_list`.
    pub total: Field<usize>,
    /// `"{Title} - {Version}"`, sorted.
    pub updates_list: Field<Vec<String>>,
    /// Always `total > 0`.
    pub update_available: Field<bool>,
}

impl UpdateRecord {
    /// Builds the record from package labels; sorting and the derived counters
    /// are applied here so they cannot disagree.
    pub fn from_labels(node: impl Into<String>, mut labels: Vec<String>) -> Self {
        labels.sort();
        let total = labels.len();
        Self {
            node: node.into(),
            total: Field::Value(total),
            updates_list: Field::Value(labels),
            update_available: Field::Value(total > 0),
        }
    }

    /// Record for a node whose package list could not be read.
    pub fn unknown(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            total: Field::Absent,
            updates_list: Field::Absent,
            update_available: Field::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskRecord {
    pub node: String,
    /// Configured identifier (device path, WWN, by-id link or serial).
    pub disk_id: String,
    pub path: Option<String>,
    pub vendor: Option<String>,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub disk_type: Option<DiskType>,
    pub size: Field<u64>,
    pub health: Field<String>,
    /// Wear level in percent (flash only).
    pub wearout: Field<f64>,
    /// Rotating media only.
    pub rpm: Field<f64>,
    pub temperature: Field<i64>,
    pub temperature_air: Field<i64>,
    pub power_cycles: Field<u64>,
    pub power_hours: Field<u64>,
    pub life_left: Field<u64>,
    pub power_loss: Field<u64>,
}

impl DiskRecord {
    /// Record for a node whose disk list could not be read.
    pub fn unknown(node: impl Into<String>, disk_id: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            disk_id: disk_id.into(),
            path: None,
            vendor: None,
            serial: None,
            model: None,
            disk_type: None,
            size: Field::Absent,
            health: Field::Absent,
            wearout: Field::Absent,
            rpm: Field::Absent,
            temperature: Field::Absent,
            temperature_air: Field::Absent,
            power_cycles: Field::Absent,
            power_hours: Field::Absent,
            life_left: Field::Absent,
            power_loss: Field::Absent,
        }
    }
}

/// One refresh result, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceRecord {
    Node(NodeRecord),
    Qemu(VmRecord),
    Lxc(LxcRecord),
    Storage(StorageRecord),
    Update(UpdateRecord),
    Disk(DiskRecord),
}

impl ResourceRecord {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRecord::Node(_) => ResourceKind::Node,
            ResourceRecord::Qemu(_) => ResourceKind::Qemu,
            ResourceRecord::Lxc(_) => ResourceKind::Lxc,
            ResourceRecord::Storage(_) => ResourceKind::Storage,
            ResourceRecord::Update(_) => ResourceKind::Update,
            ResourceRecord::Disk(_) => ResourceKind::Disk,
        }
    }

    /// Node hosting the resource; `None` for nodes themselves and for storages
    /// the cluster listing did not attribute to a node.
    pub fn owning_node(&self) -> Option<&str> {
        match self {
            ResourceRecord::Node(_) => None,
            ResourceRecord::Qemu(r) => Some(&r.node),
            ResourceRecord::Lxc(r) => Some(&r.node),
            ResourceRecord::Storage(r) => r.node.as_deref(),
            ResourceRecord::Update(r) => Some(&r.node),
            ResourceRecord::Disk(r) => Some(&r.node),
        }
    }

    /// Status string, for the kinds that report one.
    pub fn status(&self) -> Field<&str> {
        match self {
            ResourceRecord::Node(r) => r.status.as_ref().map(String::as_str),
            ResourceRecord::Qemu(r) => r.status.as_ref().map(String::as_str),
            ResourceRecord::Lxc(r) => r.status.as_ref().map(String::as_str),
            ResourceRecord::Disk(r) => r.health.as_ref().map(String::as_str),
            ResourceRecord::Storage(_) | ResourceRecord::Update(_) => Field::Absent,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRecord> {
        match self {
            ResourceRecord::Node(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_vm(&self) -> Option<&VmRecord> {
        match self {
            ResourceRecord::Qemu(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_lxc(&self) -> Option<&LxcRecord> {
        match self {
            ResourceRecord::Lxc(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&StorageRecord> {
        match self {
            ResourceRecord::Storage(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_update(&self) -> Option<&UpdateRecord> {
        match self {
            ResourceRecord::Update(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_disk(&self) -> Option<&DiskRecord> {
        match self {
            ResourceRecord::Disk(r) => Some(r),
            _ => None,
        }
    }
}
