use crate::{
    core::domain::{
        error::ProxmoxResult,
        model::{
            device::DeviceIdentity,
            field::{Field, difference},
            guest::GuestStatusCurrent,
            record::{LxcRecord, ResourceRecord},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        coordinator::{
            Coordinator,
            guest::{fetch_status, resolve_node},
        },
        service::poller_service::PollerService,
    },
};
use async_trait::async_trait;

/// Polls one container. Same node resolution as VMs, plus swap accounting.
pub struct LxcCoordinator {
    poller: PollerService,
    vmid: u32,
    identity: DeviceIdentity,
}

impl LxcCoordinator {
    pub fn new(poller: PollerService, vmid: u32) -> Self {
        let identity =
            DeviceIdentity::new(poller.context().scope(), ResourceKind::Lxc, vmid.to_string());
        Self {
            poller,
            vmid,
            identity,
        }
    }
}

#[async_trait]
impl Coordinator for LxcCoordinator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Lxc
    }

    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn fetch(&self) -> ProxmoxResult<ResourceRecord> {
        let node = resolve_node(&self.poller, ResourceKind::Lxc, self.vmid).await?;
        let status = fetch_status(&self.poller, ResourceKind::Lxc, &node, self.vmid).await?;
        Ok(ResourceRecord::Lxc(build_record(self.vmid, node, status)))
    }
}

fn build_record(vmid: u32, node: String, status: GuestStatusCurrent) -> LxcRecord {
    let memory_total = Field::from_option(status.maxmem);
    let memory_used = Field::from_option(status.mem);
    let swap_total = Field::from_option(status.maxswap);
    let swap_used = Field::from_option(status.swap);
    LxcRecord {
        vmid,
        node,
        name: Field::from_option(status.name.clone()),
        status: Field::from_option(status.effective_status()),
        uptime: Field::from_option(status.uptime),
        cpu: Field::from_option(status.cpu),
        memory_free: difference(&memory_total, &memory_used),
        memory_total,
        memory_used,
        network_in: Field::from_option(status.netin),
        network_out: Field::from_option(status.netout),
        disk_total: Field::from_option(status.maxdisk),
        disk_used: Field::from_option(status.disk),
        swap_free: difference(&swap_total, &swap_used),
        swap_total,
        swap_used,
    }
}
