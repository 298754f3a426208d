use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            device::DeviceIdentity,
            disk::{DiskListItem, SmartData},
            field::Field,
            record::{DiskRecord, ResourceRecord},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        coordinator::{Coordinator, smart::SmartMetrics},
        service::poller_service::{PollScope, PollerService},
    },
};
use async_trait::async_trait;
use tracing::debug;

/// Polls one physical disk: the node's disk list, then its SMART report.
pub struct DiskCoordinator {
    poller: PollerService,
    node: String,
    disk_id: String,
    identity: DeviceIdentity,
}

impl DiskCoordinator {
    pub fn new(poller: PollerService, node: &str, disk_id: &str) -> Self {
        let identity = DeviceIdentity::disk(poller.context().scope(), node, disk_id);
        Self {
            poller,
            node: node.to_string(),
            disk_id: disk_id.to_string(),
            identity,
        }
    }

    /// SMART is best effort: only an authentication failure aborts the cycle.
    async fn smart_report(&self, devpath: &str) -> ProxmoxResult<Option<SmartData>> {
        let disk: String = url::form_urlencoded::byte_serialize(devpath.as_bytes()).collect();
        let path = format!("nodes/{}/disks/smart?disk={}", self.node, disk);
        match self.poller.poll_secondary(&path).await {
            Ok(report) => Ok(report),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                debug!("SMART report of {} on {} unavailable: {}", devpath, self.node, error);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Coordinator for DiskCoordinator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Disk
    }

    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn fetch(&self) -> ProxmoxResult<ResourceRecord> {
        let disks: Option<Vec<DiskListItem>> = self
            .poller
            .poll(
                &format!("nodes/{}/disks/list", self.node),
                &PollScope::disk(&self.node, &self.disk_id),
                true,
            )
            .await?;
        let Some(disks) = disks else {
            return Ok(ResourceRecord::Disk(DiskRecord::unknown(&self.node, &self.disk_id)));
        };

        let disk = disks
            .into_iter()
            .find(|disk| disk.matches(&self.disk_id))
            .ok_or_else(|| {
                ProxmoxError::UpdateFailed(format!(
                    "Disk {} not found on node {}",
                    self.disk_id, self.node
                ))
            })?;

        let report = match disk.devpath.as_deref() {
            Some(devpath) => self.smart_report(devpath).await?,
            None => None,
        };
        let metrics = report
            .as_ref()
            .map(SmartMetrics::from_report)
            .unwrap_or_default();
        Ok(ResourceRecord::Disk(build_record(
            &self.node,
            &self.disk_id,
            disk,
            report,
            metrics,
        )))
    }
}

fn build_record(
    node: &str,
    disk_id: &str,
    disk: DiskListItem,
    report: Option<SmartData>,
    metrics: SmartMetrics,
) -> DiskRecord {
    let kind = disk.kind();
    let wearout = if kind.is_some_and(|kind| kind.reports_wearout()) {
        Field::from_option(disk.wearout)
    } else {
        Field::Absent
    };
    let rpm = if kind.is_some_and(|kind| kind.reports_rpm()) {
        Field::from_option(disk.rpm)
    } else {
        Field::Absent
    };
    let health = disk
        .health
        .or_else(|| report.and_then(|report| report.health));

    DiskRecord {
        node: node.to_string(),
        disk_id: disk_id.to_string(),
        path: disk.devpath,
        vendor: disk.vendor,
        serial: disk.serial,
        model: disk.model,
        disk_type: kind,
        size: Field::from_option(disk.size),
        health: Field::from_option(health),
        wearout,
        rpm,
        temperature: Field::from_option(metrics.temperature),
        temperature_air: Field::from_option(metrics.temperature_air),
        power_cycles: Field::from_option(metrics.power_cycles),
        power_hours: Field::from_option(metrics.power_hours),
        life_left: Field::from_option(metrics.life_left),
        power_loss: Field::from_option(metrics.power_loss),
    }
}
