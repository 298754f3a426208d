//! Keeps the parent ("via") link of each resource device pointed at the
//! device of the node currently hosting it.

use crate::{
    core::domain::model::{
        device::{DeviceIdentity, DeviceInfo},
        record::ResourceRecord,
    },
    monitor::application::context::MonitorContext,
};
use std::sync::Arc;
use tracing::{debug, info};

/// What a reconcile did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The via link was written.
    Linked,
    /// The stored link already matched, or the resource has no parent.
    Unchanged,
    /// The owning node has no device yet; nothing was written.
    ParentMissing,
    /// The owning node has no device and the stored link pointed elsewhere,
    /// so the link was cleared.
    Unlinked,
}

#[derive(Clone)]
pub struct TopologyService {
    context: Arc<MonitorContext>,
}

impl TopologyService {
    pub fn new(context: Arc<MonitorContext>) -> Self {
        Self { context }
    }

    /// Ensures the device for `identity` exists and links it to the device of
    /// `owning_node`. The link is only written when it changes. A link to a
    /// previous owner is cleared when the new owner has no device.
    pub async fn reconcile(
        &self,
        identity: &DeviceIdentity,
        info: DeviceInfo,
        owning_node: Option<&DeviceIdentity>,
    ) -> LinkOutcome {
        let devices = self.context.devices();
        let device = devices.get_or_create(identity, info).await;
        let Some(owning_node) = owning_node else {
            return LinkOutcome::Unchanged;
        };
        let Some(parent) = devices.get(owning_node).await else {
            if device.via_device_id.is_none() {
                debug!("{} has no device yet, leaving {} unlinked", owning_node, identity);
                return LinkOutcome::ParentMissing;
            }
            info!(
                "{} moved to {}, which has no device; clearing its link",
                identity, owning_node
            );
            devices.update_via_device(&device.id, None).await;
            return LinkOutcome::Unlinked;
        };
        if device.via_device_id.as_deref() == Some(parent.id.as_str()) {
            return LinkOutcome::Unchanged;
        }
        debug!("Linking {} via {}", identity, owning_node);
        devices
            .update_via_device(&device.id, Some(parent.id))
            .await;
        LinkOutcome::Linked
    }

    /// Publishes the device of a freshly fetched record.
    pub async fn reconcile_record(
        &self,
        identity: &DeviceIdentity,
        record: &ResourceRecord,
    ) -> LinkOutcome {
        let owning_node = record
            .owning_node()
            .map(|node| DeviceIdentity::node(self.context.scope(), node));
        self.reconcile(identity, self.device_info(record), owning_node.as_ref())
            .await
    }

    /// Display attributes for the device of `record`.
    pub fn device_info(&self, record: &ResourceRecord) -> DeviceInfo {
        match record {
            ResourceRecord::Node(node) => DeviceInfo {
                name: Some(format!("Node {}", node.node)),
                model: node.model.value().cloned(),
                configuration_url: Some(self.context.console_url(&format!("node/{}", node.node))),
            },
            ResourceRecord::Qemu(vm) => DeviceInfo {
                name: Some(format!(
                    "QEMU {} ({})",
                    vm.name.value().map(String::as_str).unwrap_or_default(),
                    vm.vmid
                )),
                model: Some("QEMU".to_string()),
                configuration_url: Some(self.context.console_url(&format!("qemu/{}", vm.vmid))),
            },
            ResourceRecord::Lxc(ct) => DeviceInfo {
                name: Some(format!(
                    "LXC {} ({})",
                    ct.name.value().map(String::as_str).unwrap_or_default(),
                    ct.vmid
                )),
                model: Some("LXC".to_string()),
                configuration_url: Some(self.context.console_url(&format!("lxc/{}", ct.vmid))),
            },
            ResourceRecord::Storage(storage) => DeviceInfo {
                name: Some(storage.name.clone()),
                model: Some("Storage".to_string()),
                configuration_url: Some(self.context.console_url(&storage.storage_id)),
            },
            ResourceRecord::Update(update) => DeviceInfo {
                name: Some(format!("Updates {}", update.node)),
                model: Some("Update".to_string()),
                configuration_url: Some(self.context.console_url(&format!("node/{}", update.node))),
            },
            ResourceRecord::Disk(disk) => DeviceInfo {
                name: Some(format!(
                    "Disk {}: {} ({})",
                    disk.node,
                    disk.model.as_deref().unwrap_or("unknown"),
                    disk.disk_id
                )),
                model: disk.model.clone(),
                configuration_url: Some(self.context.console_url(&format!("node/{}", disk.node))),
            },
        }
    }
}
