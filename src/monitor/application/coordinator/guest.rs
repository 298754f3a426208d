//! Node resolution and status reads shared by the VM and container
//! coordinators.
//!
//! Guests migrate, so the hosting node is looked up in the cluster listing on
//! every cycle.

use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            cluster_resource::ClusterResource, guest::GuestStatusCurrent,
            node_list_item::NODE_ONLINE, resource_kind::ResourceKind,
        },
    },
    monitor::application::service::poller_service::{PollScope, PollerService},
};
use serde_json::Value;

/// Finds the node currently hosting the guest.
///
/// # Errors
/// `UpdateFailed` when the listing does not contain the guest or reports its
/// node as not online.
pub(crate) async fn resolve_node(
    poller: &PollerService,
    kind: ResourceKind,
    vmid: u32,
) -> ProxmoxResult<String> {
    let listing: Vec<Value> = poller
        .poll("cluster/resources", &PollScope::Cluster, false)
        .await?
        .unwrap_or_default();
    let resources: Vec<ClusterResource> = listing
        .into_iter()
        .filter_map(ClusterResource::from_value)
        .collect();

    let node = resources
        .iter()
        .find_map(|resource| match (kind, resource) {
            (ResourceKind::Qemu, ClusterResource::Qemu(guest))
            | (ResourceKind::Lxc, ClusterResource::Lxc(guest))
                if guest.vmid == Some(vmid) =>
            {
                guest.common.node.clone()
            }
            _ => None,
        })
        .ok_or_else(|| {
            ProxmoxError::UpdateFailed(format!("{} {} unable to be found", kind.label(), vmid))
        })?;

    let node_down = resources.iter().any(|resource| {
        matches!(
            resource,
            ClusterResource::Node(entry)
                if entry.common.node.as_deref() == Some(node.as_str())
                    && entry.common.status.as_deref() != Some(NODE_ONLINE)
        )
    });
    if node_down {
        return Err(ProxmoxError::UpdateFailed(format!(
            "Node {} hosting {} {} is not online",
            node,
            kind.label(),
            vmid
        )));
    }
    Ok(node)
}

/// Reads `status/current` of the guest on `node`.
///
/// # Errors
/// `UpdateFailed` when the read was refused (the issue is raised by the poller).
pub(crate) async fn fetch_status(
    poller: &PollerService,
    kind: ResourceKind,
    node: &str,
    vmid: u32,
) -> ProxmoxResult<GuestStatusCurrent> {
    let path = format!("nodes/{}/{}/{}/status/current", node, kind.as_str(), vmid);
    poller
        .poll(&path, &PollScope::guest(kind, vmid), true)
        .await?
        .ok_or_else(|| {
            ProxmoxError::UpdateFailed(format!("{} {} unable to be found", kind.label(), vmid))
        })
}
