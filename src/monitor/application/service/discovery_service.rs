//! Cluster-wide discovery and validation of the operator's selection.

use crate::{
    core::domain::{
        config::ResourceSelection,
        error::ProxmoxResult,
        model::{
            cluster_resource::ClusterResource,
            repair_issue::{IssueReason, RepairIssue, issue_id},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::service::poller_service::{PollScope, PollerService},
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Resources present in one cluster listing, classified by their `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveredResources {
    pub nodes: BTreeSet<String>,
    pub qemu: BTreeSet<u32>,
    pub lxc: BTreeSet<u32>,
    /// Storage resource ids (`storage/{node}/{name}`).
    pub storage: BTreeSet<String>,
}

impl DiscoveredResources {
    /// Classifies a raw `cluster/resources` listing. Entries of an unknown
    /// type or unusable shape are skipped.
    pub fn classify(listing: &[Value]) -> Self {
        let mut discovered = Self::default();
        for resource in listing
            .iter()
            .cloned()
            .filter_map(ClusterResource::from_value)
        {
            match resource {
                ClusterResource::Node(node) => {
                    if let Some(name) = node.common.node {
                        discovered.nodes.insert(name);
                    }
                }
                ClusterResource::Qemu(guest) => {
                    if let Some(vmid) = guest.vmid {
                        discovered.qemu.insert(vmid);
                    }
                }
                ClusterResource::Lxc(guest) => {
                    if let Some(vmid) = guest.vmid {
                        discovered.lxc.insert(vmid);
                    }
                }
                ClusterResource::Storage(storage) => {
                    if !storage.common.id.is_empty() {
                        discovered.storage.insert(storage.common.id);
                    }
                }
                ClusterResource::Other => {}
            }
        }
        discovered
    }

    /// True when `selected` names a listed storage, either by full id or by
    /// storage name.
    pub fn has_storage(&self, selected: &str) -> bool {
        self.storage
            .iter()
            .any(|id| id == selected || storage_name(id) == selected)
    }
}

/// Storage name of a selection entry or resource id (`storage/pve1/local` and
/// `local` both give `local`).
pub fn storage_name(selected: &str) -> &str {
    selected.rsplit('/').next().unwrap_or(selected)
}

#[derive(Clone)]
pub struct DiscoveryService {
    poller: PollerService,
}

impl DiscoveryService {
    pub fn new(poller: PollerService) -> Self {
        Self { poller }
    }

    /// Lists every resource of the cluster with a single call.
    ///
    /// # Errors
    /// Propagates the poll error; a refusal of the listing is transient.
    pub async fn discover(&self) -> ProxmoxResult<DiscoveredResources> {
        let listing: Vec<Value> = self
            .poller
            .poll("cluster/resources", &PollScope::Cluster, false)
            .await?
            .unwrap_or_default();
        let discovered = DiscoveredResources::classify(&listing);
        debug!(
            "Discovered {} nodes, {} VMs, {} containers, {} storages",
            discovered.nodes.len(),
            discovered.qemu.len(),
            discovered.lxc.len(),
            discovered.storage.len()
        );
        Ok(discovered)
    }

    /// Checks the saved selection against the live listing.
    ///
    /// Missing resources raise a `resource_nonexistent` issue and are left out
    /// of the returned selection; present ones clear theirs.
    pub async fn validate_selection(
        &self,
        selection: &ResourceSelection,
        discovered: &DiscoveredResources,
    ) -> ResourceSelection {
        let mut available = ResourceSelection::default();

        for node in &selection.nodes {
            if self
                .check(ResourceKind::Node, node, node, discovered.nodes.contains(node))
                .await
            {
                available.nodes.push(node.clone());
            }
        }
        for vmid in &selection.qemu {
            let id = vmid.to_string();
            if self
                .check(ResourceKind::Qemu, &id, &id, discovered.qemu.contains(vmid))
                .await
            {
                available.qemu.push(*vmid);
            }
        }
        for vmid in &selection.lxc {
            let id = vmid.to_string();
            if self
                .check(ResourceKind::Lxc, &id, &id, discovered.lxc.contains(vmid))
                .await
            {
                available.lxc.push(*vmid);
            }
        }
        for storage in &selection.storage {
            let name = storage_name(storage);
            if self
                .check(ResourceKind::Storage, name, name, discovered.has_storage(storage))
                .await
            {
                available.storage.push(storage.clone());
            }
        }

        available
    }

    async fn check(&self, kind: ResourceKind, resource: &str, target: &str, present: bool) -> bool {
        let context = self.poller.context();
        if present {
            context
                .issues()
                .delete(&issue_id(
                    context.scope(),
                    resource,
                    IssueReason::ResourceNonexistent,
                ))
                .await;
            return true;
        }

        info!("{} {} is no longer present, skipping it", kind.label(), resource);
        let connection = context.api().connection();
        context
            .issues()
            .create(RepairIssue::resource_nonexistent(
                context.scope(),
                resource,
                kind,
                target,
                connection.proxmox_host().as_str(),
                connection.proxmox_port().get(),
            ))
            .await;
        false
    }
}
