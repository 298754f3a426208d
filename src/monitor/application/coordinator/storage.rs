use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            cluster_resource::{ClusterResource, StorageResource},
            device::DeviceIdentity,
            field::Field,
            record::{ResourceRecord, StorageRecord},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        coordinator::Coordinator,
        service::{
            discovery_service::storage_name,
            poller_service::{PollScope, PollerService},
        },
    },
};
use async_trait::async_trait;
use serde_json::Value;

/// Polls one storage from the storage-filtered cluster listing, which also
/// names the owning node.
pub struct StorageCoordinator {
    poller: PollerService,
    /// Full id (`storage/pve1/local`) or bare name, as selected.
    storage: String,
    identity: DeviceIdentity,
}

impl StorageCoordinator {
    pub fn new(poller: PollerService, storage: &str) -> Self {
        let identity = DeviceIdentity::new(poller.context().scope(), ResourceKind::Storage, storage);
        Self {
            poller,
            storage: storage.to_string(),
            identity,
        }
    }

    fn matches(&self, resource: &StorageResource) -> bool {
        resource.common.id == self.storage || resource.storage_name() == self.storage
    }
}

#[async_trait]
impl Coordinator for StorageCoordinator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn fetch(&self) -> ProxmoxResult<ResourceRecord> {
        let not_found =
            || ProxmoxError::UpdateFailed(format!("Storage {} unable to be found", self.storage));
        let listing: Vec<Value> = self
            .poller
            .poll(
                "cluster/resources?type=storage",
                &PollScope::storage(storage_name(&self.storage)),
                true,
            )
            .await?
            .ok_or_else(not_found)?;

        let resource = listing
            .into_iter()
            .filter_map(ClusterResource::from_value)
            .find_map(|resource| match resource {
                ClusterResource::Storage(storage) if self.matches(&storage) => Some(storage),
                _ => None,
            })
            .ok_or_else(not_found)?;

        let content = resource.content.clone().ok_or_else(|| {
            ProxmoxError::UpdateFailed(format!("Storage {} reports no content types", self.storage))
        })?;
        let name = format!(
            "Storage {}",
            resource.common.id.trim_start_matches("storage/")
        );
        Ok(ResourceRecord::Storage(StorageRecord {
            storage_id: resource.common.id,
            node: resource.common.node,
            name,
            disk_total: Field::from_option(resource.maxdisk),
            disk_used: Field::from_option(resource.disk),
            content: Field::Value(content),
        }))
    }
}
