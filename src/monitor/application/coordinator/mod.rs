//! Per-resource coordinators.
//!
//! A [`Coordinator`] knows how to assemble one typed record for one resource;
//! [`runner::CoordinatorHandle`] drives it on a timer and holds the published
//! state.

pub mod disk;
pub mod guest;
pub mod lxc;
pub mod node;
pub mod qemu;
pub mod runner;
pub mod smart;
pub mod storage;
pub mod update;

use crate::{
    core::domain::{
        error::ProxmoxResult,
        model::{device::DeviceIdentity, record::ResourceRecord, resource_kind::ResourceKind},
    },
    monitor::application::{
        context::MonitorContext,
        service::{
            discovery_service::storage_name,
            poller_service::{PollScope, PollerService},
        },
    },
};
use async_trait::async_trait;
use std::{fmt, sync::Arc};

/// One refresh unit for one resource.
#[async_trait]
pub trait Coordinator: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Identity of the device the record belongs to.
    fn identity(&self) -> &DeviceIdentity;

    /// Runs the polls of one cycle and assembles the record.
    ///
    /// # Errors
    /// Fatal errors stop the endpoint; any other error marks the cycle failed.
    async fn fetch(&self) -> ProxmoxResult<ResourceRecord>;
}

/// A resource to build a coordinator for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoordinatorTarget {
    Node(String),
    Qemu(u32),
    Lxc(u32),
    /// Storage id or name as selected.
    Storage(String),
    /// Pending updates of a node.
    Update(String),
    Disk { node: String, disk_id: String },
}

impl CoordinatorTarget {
    pub fn kind(&self) -> ResourceKind {
        match self {
            CoordinatorTarget::Node(_) => ResourceKind::Node,
            CoordinatorTarget::Qemu(_) => ResourceKind::Qemu,
            CoordinatorTarget::Lxc(_) => ResourceKind::Lxc,
            CoordinatorTarget::Storage(_) => ResourceKind::Storage,
            CoordinatorTarget::Update(_) => ResourceKind::Update,
            CoordinatorTarget::Disk { .. } => ResourceKind::Disk,
        }
    }

    /// Identity of the device the coordinator of this target publishes to.
    pub fn identity(&self, scope: &str) -> DeviceIdentity {
        match self {
            CoordinatorTarget::Node(node) => DeviceIdentity::node(scope, node),
            CoordinatorTarget::Qemu(vmid) | CoordinatorTarget::Lxc(vmid) => {
                DeviceIdentity::new(scope, self.kind(), vmid.to_string())
            }
            CoordinatorTarget::Storage(name) | CoordinatorTarget::Update(name) => {
                DeviceIdentity::new(scope, self.kind(), name.as_str())
            }
            CoordinatorTarget::Disk { node, disk_id } => DeviceIdentity::disk(scope, node, disk_id),
        }
    }

    /// Scope of the primary read, which owns the forbidden issue.
    pub fn poll_scope(&self) -> PollScope {
        match self {
            CoordinatorTarget::Node(node) => PollScope::node(node),
            CoordinatorTarget::Qemu(vmid) | CoordinatorTarget::Lxc(vmid) => {
                PollScope::guest(self.kind(), *vmid)
            }
            CoordinatorTarget::Storage(storage) => PollScope::storage(storage_name(storage)),
            CoordinatorTarget::Update(node) => PollScope::update(node),
            CoordinatorTarget::Disk { node, disk_id } => PollScope::disk(node, disk_id),
        }
    }

    /// Builds the coordinator for this target.
    pub fn build(&self, context: Arc<MonitorContext>) -> Arc<dyn Coordinator> {
        let poller = PollerService::new(context);
        match self {
            CoordinatorTarget::Node(node) => Arc::new(node::NodeCoordinator::new(poller, node)),
            CoordinatorTarget::Qemu(vmid) => Arc::new(qemu::QemuCoordinator::new(poller, *vmid)),
            CoordinatorTarget::Lxc(vmid) => Arc::new(lxc::LxcCoordinator::new(poller, *vmid)),
            CoordinatorTarget::Storage(storage) => {
                Arc::new(storage::StorageCoordinator::new(poller, storage))
            }
            CoordinatorTarget::Update(node) => {
                Arc::new(update::UpdateCoordinator::new(poller, node))
            }
            CoordinatorTarget::Disk { node, disk_id } => {
                Arc::new(disk::DiskCoordinator::new(poller, node, disk_id))
            }
        }
    }
}

impl fmt::Display for CoordinatorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorTarget::Node(node) => write!(f, "Node {}", node),
            CoordinatorTarget::Qemu(vmid) => write!(f, "QEMU {}", vmid),
            CoordinatorTarget::Lxc(vmid) => write!(f, "LXC {}", vmid),
            CoordinatorTarget::Storage(storage) => write!(f, "Storage {}", storage),
            CoordinatorTarget::Update(node) => write!(f, "Update {}", node),
            CoordinatorTarget::Disk { node, disk_id } => write!(f, "Disk {} {}", node, disk_id),
        }
    }
}
