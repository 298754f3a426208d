use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            device::DeviceIdentity,
            field::Field,
            guest::GuestListItem,
            node_list_item::{NodeListItem, find_node},
            node_status::{MemoryInfo, NodeStatus, NodeVersion},
            record::{NodeRecord, ResourceRecord},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        coordinator::Coordinator,
        service::poller_service::{PollScope, PollerService},
    },
};
use async_trait::async_trait;
use tracing::debug;

/// Polls one node: liveness from the node list, then status, version and
/// the running guests when online.
pub struct NodeCoordinator {
    poller: PollerService,
    node: String,
    identity: DeviceIdentity,
}

impl NodeCoordinator {
    pub fn new(poller: PollerService, node: &str) -> Self {
        let identity = DeviceIdentity::node(poller.context().scope(), node);
        Self {
            poller,
            node: node.to_string(),
            identity,
        }
    }
}

#[async_trait]
impl Coordinator for NodeCoordinator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Node
    }

    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn fetch(&self) -> ProxmoxResult<ResourceRecord> {
        let nodes = node_listing(&self.poller).await?;
        let Some(entry) = find_node(&nodes, &self.node).filter(|entry| entry.is_online()) else {
            debug!("Node {} is not online, skipping detail reads", self.node);
            return Ok(ResourceRecord::Node(NodeRecord::offline(&self.node)));
        };

        let status: NodeStatus = self
            .poller
            .poll(
                &format!("nodes/{}/status", self.node),
                &PollScope::node(&self.node),
                true,
            )
            .await?
            .ok_or_else(|| {
                ProxmoxError::UpdateFailed(format!("Node {} unable to be found", self.node))
            })?;
        let version: Option<NodeVersion> = self
            .poller
            .poll_secondary(&format!("nodes/{}/version", self.node))
            .await?;
        let qemu: Vec<GuestListItem> = self
            .poller
            .poll_secondary(&format!("nodes/{}/qemu", self.node))
            .await?
            .unwrap_or_default();
        let lxc: Vec<GuestListItem> = self
            .poller
            .poll_secondary(&format!("nodes/{}/lxc", self.node))
            .await?
            .unwrap_or_default();

        Ok(ResourceRecord::Node(build_record(
            entry, status, version, &qemu, &lxc,
        )))
    }
}

/// The cluster node list. A missing or empty listing says nothing about any
/// node, so it fails the cycle instead of reading as offline.
pub(super) async fn node_listing(poller: &PollerService) -> ProxmoxResult<Vec<NodeListItem>> {
    let nodes: Vec<NodeListItem> = poller
        .poll("nodes", &PollScope::Cluster, false)
        .await?
        .unwrap_or_default();
    if nodes.is_empty() {
        return Err(ProxmoxError::UpdateFailed("Node list is empty".to_string()));
    }
    Ok(nodes)
}

fn build_record(
    entry: &NodeListItem,
    status: NodeStatus,
    version: Option<NodeVersion>,
    qemu: &[GuestListItem],
    lxc: &[GuestListItem],
) -> NodeRecord {
    let memory = status.memory.unwrap_or_default();
    let swap = status.swap.unwrap_or_default();
    let (qemu_on, qemu_on_list) = running(qemu);
    let (lxc_on, lxc_on_list) = running(lxc);
    let (memory_total, memory_used, memory_free) = counters(memory);
    let (swap_total, swap_used, swap_free) = counters(swap);

    NodeRecord {
        node: entry.node.clone(),
        status: Field::from_option(entry.status.clone()),
        model: Field::from_option(status.cpuinfo.and_then(|cpu| cpu.model)),
        version: Field::from_option(version.and_then(|v| v.version)),
        uptime: Field::from_option(status.uptime),
        cpu: Field::from_option(entry.cpu),
        disk_total: Field::from_option(entry.maxdisk),
        disk_used: Field::from_option(entry.disk),
        memory_total,
        memory_used,
        memory_free,
        swap_total,
        swap_used,
        swap_free,
        qemu_on,
        qemu_on_list: Field::Value(qemu_on_list),
        lxc_on,
        lxc_on_list: Field::Value(lxc_on_list),
    }
}

fn counters(info: MemoryInfo) -> (Field<u64>, Field<u64>, Field<u64>) {
    (
        Field::from_option(info.total),
        Field::from_option(info.used),
        Field::from_option(info.free),
    )
}

/// Count and labels of the guests whose status is exactly `running`.
fn running(guests: &[GuestListItem]) -> (u32, Vec<String>) {
    let labels: Vec<String> = guests
        .iter()
        .filter(|guest| guest.is_running())
        .map(GuestListItem::display_label)
        .collect();
    (labels.len() as u32, labels)
}
