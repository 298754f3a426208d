use crate::{
    core::domain::{
        error::ProxmoxResult,
        model::{
            apt_update::AptUpdateEntry,
            device::DeviceIdentity,
            node_list_item::{NodeListItem, find_node},
            record::{ResourceRecord, UpdateRecord},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        coordinator::{Coordinator, node::node_listing},
        service::poller_service::{PollScope, PollerService},
    },
};
use async_trait::async_trait;
use tracing::debug;

/// Polls the pending package list of one node.
pub struct UpdateCoordinator {
    poller: PollerService,
    node: String,
    identity: DeviceIdentity,
}

impl UpdateCoordinator {
    pub fn new(poller: PollerService, node: &str) -> Self {
        let identity = DeviceIdentity::new(poller.context().scope(), ResourceKind::Update, node);
        Self {
            poller,
            node: node.to_string(),
            identity,
        }
    }
}

#[async_trait]
impl Coordinator for UpdateCoordinator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Update
    }

    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn fetch(&self) -> ProxmoxResult<ResourceRecord> {
        let nodes = node_listing(&self.poller).await?;
        if !find_node(&nodes, &self.node).is_some_and(NodeListItem::is_online) {
            debug!("Node {} is not online, package list unknown", self.node);
            return Ok(ResourceRecord::Update(UpdateRecord::unknown(&self.node)));
        }

        let entries: Option<Vec<AptUpdateEntry>> = self
            .poller
            .poll(
                &format!("nodes/{}/apt/update", self.node),
                &PollScope::update(&self.node),
                true,
            )
            .await?;
        let record = match entries {
            Some(entries) => UpdateRecord::from_labels(
                &self.node,
                entries.iter().map(AptUpdateEntry::label).collect(),
            ),
            None => UpdateRecord::unknown(&self.node),
        };
        Ok(ResourceRecord::Update(record))
    }
}
