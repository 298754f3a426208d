//! Lifecycle of one configured endpoint: setup, reload and unload.

use crate::{
    ProxmoxClient,
    core::domain::{
        config::{IntegrationConfig, ResourceSelection, ValidationConfig},
        error::{ProxmoxError, ProxmoxResult},
        model::{
            device::{DeviceIdentity, DeviceInfo},
            disk::DiskListItem,
            repair_issue::{IssueReason, issue_id},
        },
        registry::{DeviceRegistry, IssueRegistry},
    },
    monitor::{
        application::{
            context::MonitorContext,
            coordinator::{
                CoordinatorTarget,
                runner::CoordinatorHandle,
            },
            service::{
                command_service::CommandService,
                discovery_service::{DiscoveredResources, DiscoveryService},
                poller_service::PollerService,
            },
        },
        diagnostics::{Diagnostics, redact_config},
    },
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

type Coordinators = BTreeMap<CoordinatorTarget, Arc<CoordinatorHandle>>;

/// One monitored endpoint and its coordinators.
pub struct Integration {
    config: IntegrationConfig,
    context: Arc<MonitorContext>,
    discovery: DiscoveryService,
    coordinators: RwLock<Coordinators>,
    selection: RwLock<ResourceSelection>,
    lifecycle: tokio::sync::Mutex<()>,
}

impl Integration {
    /// Connects, validates the selection, runs the first refresh of every
    /// coordinator and starts their timers.
    ///
    /// # Errors
    /// `Authentication` means the credentials must be reconfigured. `Tls`,
    /// `Timeout`, `Connection` and `Api` mean the endpoint is not ready and
    /// setup should be retried later. `Validation` rejects the configuration.
    pub async fn setup(
        config: IntegrationConfig,
        devices: Arc<dyn DeviceRegistry>,
        issues: Arc<dyn IssueRegistry>,
    ) -> ProxmoxResult<Self> {
        config.validate(&ValidationConfig::default())?;
        let client = ProxmoxClient::from_config(&config)?;
        Self::setup_with_client(config, client, devices, issues).await
    }

    pub(crate) async fn setup_with_client(
        config: IntegrationConfig,
        client: ProxmoxClient,
        devices: Arc<dyn DeviceRegistry>,
        issues: Arc<dyn IssueRegistry>,
    ) -> ProxmoxResult<Self> {
        info!("Setting up {} ({}:{})", config.entry_id, config.host, config.port);
        client.login().await?;

        let context = Arc::new(MonitorContext::new(
            config.entry_id.clone(),
            client.api_client(),
            devices,
            issues,
        ));
        let integration = Self {
            discovery: DiscoveryService::new(PollerService::new(context.clone())),
            selection: RwLock::new(config.selection.clone()),
            config,
            context,
            coordinators: RwLock::new(BTreeMap::new()),
            lifecycle: tokio::sync::Mutex::new(()),
        };
        let selection = integration.config.selection.clone();
        integration.apply(selection).await?;
        Ok(integration)
    }

    /// Re-validates a (possibly changed) selection against the cluster.
    /// Coordinators of resources no longer selected or no longer present are
    /// stopped; newly selected or reappeared ones are started.
    ///
    /// # Errors
    /// `Authentication` when the endpoint needs reauthentication; the
    /// discovery error when the cluster listing cannot be read.
    pub async fn reload(&self, selection: ResourceSelection) -> ProxmoxResult<()> {
        if self.context.needs_reauth() {
            return Err(ProxmoxError::Authentication(
                "Reauthentication required".to_string(),
            ));
        }
        info!("Reloading {}", self.config.entry_id);
        self.apply(selection).await
    }

    /// Cancels every timer and in-flight cycle.
    pub async fn unload(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        info!("Unloading {}", self.config.entry_id);
        self.context.shutdown();
        let handles: Vec<Arc<CoordinatorHandle>> =
            self.read_coordinators().values().cloned().collect();
        for handle in handles {
            handle.terminate().await;
        }
    }

    async fn apply(&self, selection: ResourceSelection) -> ProxmoxResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let discovered = self.discovery.discover().await?;
        let available = self.discovery.validate_selection(&selection, &discovered).await;
        let wanted = self.plan(&available, &discovered).await?;
        let deselected = deselected(&self.selection(), &selection);
        *self.write_selection() = selection;

        self.create_node_devices(&available).await;

        let (stale, fresh) = {
            let mut coordinators = self.write_coordinators();
            let stale: Vec<Arc<CoordinatorHandle>> = coordinators
                .iter()
                .filter(|(target, _)| !wanted.contains(*target))
                .map(|(_, handle)| handle.clone())
                .collect();
            coordinators.retain(|target, _| wanted.contains(target));

            let mut fresh = Vec::new();
            for target in &wanted {
                if !coordinators.contains_key(target) {
                    let handle = CoordinatorHandle::new(target.clone(), self.context.clone());
                    coordinators.insert(target.clone(), handle.clone());
                    fresh.push(handle);
                }
            }
            (stale, fresh)
        };

        for handle in stale {
            debug!("Stopping {}", handle.target());
            handle.terminate().await;
            self.release(handle.target(), false).await;
        }
        for target in &deselected {
            self.release(target, true).await;
        }
        self.first_refresh(&fresh).await?;
        let period = self.config.scan_interval();
        for handle in &fresh {
            handle.spawn(period);
        }
        info!(
            "{} monitoring {} resources",
            self.config.entry_id,
            self.read_coordinators().len()
        );
        Ok(())
    }

    /// Every coordinator target for the validated selection.
    async fn plan(
        &self,
        available: &ResourceSelection,
        discovered: &DiscoveredResources,
    ) -> ProxmoxResult<BTreeSet<CoordinatorTarget>> {
        let mut targets = BTreeSet::new();
        for node in &available.nodes {
            targets.insert(CoordinatorTarget::Node(node.clone()));
            if self.config.options.update_enable {
                targets.insert(CoordinatorTarget::Update(node.clone()));
            }
            if self.config.options.disks_enable {
                for disk_id in self.disk_ids(node).await? {
                    targets.insert(CoordinatorTarget::Disk {
                        node: node.clone(),
                        disk_id,
                    });
                }
            }
        }
        targets.extend(available.qemu.iter().copied().map(CoordinatorTarget::Qemu));
        targets.extend(available.lxc.iter().copied().map(CoordinatorTarget::Lxc));
        targets.extend(available.storage.iter().cloned().map(CoordinatorTarget::Storage));
        debug!(
            "Planned {} coordinators from {} discovered nodes",
            targets.len(),
            discovered.nodes.len()
        );
        Ok(targets)
    }

    /// Disks of `node`; a refused or failing listing yields none.
    async fn disk_ids(&self, node: &str) -> ProxmoxResult<Vec<String>> {
        let poller = PollerService::new(self.context.clone());
        let path = format!("nodes/{}/disks/list", node);
        match poller.poll_secondary::<Vec<DiskListItem>>(&path).await {
            Ok(disks) => Ok(disks
                .unwrap_or_default()
                .iter()
                .filter_map(|disk| disk.stable_id().map(str::to_string))
                .collect()),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!("Cannot list disks of {}: {}", node, error);
                Ok(Vec::new())
            }
        }
    }

    /// Drops the forbidden issue and the device of a resource that is no
    /// longer monitored. The `resource_nonexistent` issue only goes with a
    /// deselection; a vanished resource that is still selected keeps it.
    async fn release(&self, target: &CoordinatorTarget, deselected: bool) {
        let scope = self.context.scope();
        let poll_scope = target.poll_scope();
        if let Some(id) = poll_scope.forbidden_issue_id(scope) {
            self.context.issues().delete(&id).await;
        }
        if deselected {
            if let Some(resource) = poll_scope.resource() {
                let id = issue_id(scope, resource, IssueReason::ResourceNonexistent);
                self.context.issues().delete(&id).await;
            }
        }
        self.context.devices().remove(&target.identity(scope)).await;
    }

    async fn create_node_devices(&self, available: &ResourceSelection) {
        for node in &available.nodes {
            let identity = DeviceIdentity::node(self.context.scope(), node);
            let info = DeviceInfo {
                name: Some(format!("Node {}", node)),
                model: None,
                configuration_url: Some(self.context.console_url(&format!("node/{}", node))),
            };
            self.context.devices().get_or_create(&identity, info).await;
        }
    }

    /// Runs the first cycle of every new coordinator concurrently. Only an
    /// authentication failure aborts; other failures leave the coordinator
    /// to retry on its timer.
    async fn first_refresh(&self, handles: &[Arc<CoordinatorHandle>]) -> ProxmoxResult<()> {
        let mut cycles = JoinSet::new();
        for handle in handles {
            let handle = handle.clone();
            cycles.spawn(async move { handle.refresh().await });
        }
        let mut fatal = None;
        while let Some(joined) = cycles.join_next().await {
            match joined {
                Ok(Err(error)) if error.is_fatal() => fatal = Some(error),
                Ok(_) => {}
                Err(e) => warn!("First refresh task failed: {}", e),
            }
        }
        match fatal {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// The selection last applied by setup or reload.
    pub fn selection(&self) -> ResourceSelection {
        self.selection
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn context(&self) -> &Arc<MonitorContext> {
        &self.context
    }

    /// True once an authentication failure has halted this endpoint.
    pub fn needs_reauth(&self) -> bool {
        self.context.needs_reauth()
    }

    pub fn coordinator(&self, target: &CoordinatorTarget) -> Option<Arc<CoordinatorHandle>> {
        self.read_coordinators().get(target).cloned()
    }

    pub fn coordinators(&self) -> Vec<Arc<CoordinatorHandle>> {
        self.read_coordinators().values().cloned().collect()
    }

    pub fn commands(&self) -> CommandService {
        CommandService::new(self.context.clone())
    }

    /// Redacted configuration, coordinator states and open issues.
    ///
    /// # Errors
    /// `Parse` if the configuration cannot be serialized.
    pub async fn diagnostics(&self) -> ProxmoxResult<Diagnostics> {
        Ok(Diagnostics {
            config: redact_config(&self.config)?,
            needs_reauth: self.needs_reauth(),
            coordinators: self
                .coordinators()
                .iter()
                .map(|handle| handle.snapshot())
                .collect(),
            issues: self.context.issues().list().await,
        })
    }

    fn read_coordinators(&self) -> RwLockReadGuard<'_, Coordinators> {
        self.coordinators
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_coordinators(&self) -> RwLockWriteGuard<'_, Coordinators> {
        self.coordinators
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_selection(&self) -> RwLockWriteGuard<'_, ResourceSelection> {
        self.selection
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resources selected in `previous` but not in `next`. A dropped node takes
/// its update target along.
fn deselected(previous: &ResourceSelection, next: &ResourceSelection) -> Vec<CoordinatorTarget> {
    let mut targets = Vec::new();
    for node in previous.nodes.iter().filter(|node| !next.nodes.contains(node)) {
        targets.push(CoordinatorTarget::Node(node.clone()));
        targets.push(CoordinatorTarget::Update(node.clone()));
    }
    targets.extend(
        previous
            .qemu
            .iter()
            .filter(|vmid| !next.qemu.contains(vmid))
            .copied()
            .map(CoordinatorTarget::Qemu),
    );
    targets.extend(
        previous
            .lxc
            .iter()
            .filter(|vmid| !next.lxc.contains(vmid))
            .copied()
            .map(CoordinatorTarget::Lxc),
    );
    targets.extend(
        previous
            .storage
            .iter()
            .filter(|storage| !next.storage.contains(storage))
            .cloned()
            .map(CoordinatorTarget::Storage),
    );
    targets
}
