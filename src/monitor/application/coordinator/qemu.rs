use crate::{
    core::domain::{
        error::ProxmoxResult,
        model::{
            device::DeviceIdentity,
            field::{Field, difference},
            guest::GuestStatusCurrent,
            record::{ResourceRecord, VmRecord},
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

pub struct QemuCoordinator {
    poller: PollerService,
    vmid: u32,
    identity: DeviceIdentity,
}

impl QemuCoordinator {
    pub fn new(poller: PollerService, vmid: u32) -> Self {
        let identity =
            DeviceIdentity::new(poller.context().scope(), ResourceKind::Qemu, vmid.to_string());
        Self {
            poller,
            vmid,
            identity,
        }
    }
}

#[async_trait]
impl Coordinator for QemuCoordinator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Qemu
    }

    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn fetch(&self) -> ProxmoxResult<ResourceRecord> {
        let node = resolve_node(&self.poller, ResourceKind::Qemu, self.vmid).await?;
        let status = fetch_status(&self.poller, ResourceKind::Qemu, &node, self.vmid).await?;
        Ok(ResourceRecord::Qemu(build_record(self.vmid, node, status)))
    }
}

fn build_record(vmid: u32, node: String, status: GuestStatusCurrent) -> VmRecord {
    let memory_total = Field::from_option(status.maxmem);
    let memory_used = Field::from_option(status.mem);
    VmRecord {
        vmid,
        node,
        name: Field::from_option(status.name.clone()),
        status: Field::from_option(status.effective_status()),
        health: Field::from_option(status.qmpstatus),
        uptime: Field::from_option(status.uptime),
        cpu: Field::from_option(status.cpu),
        memory_free: difference(&memory_total, &memory_used),
        memory_total,
        memory_used,
        network_in: Field::from_option(status.netin),
        network_out: Field::from_option(status.netout),
        disk_total: Field::from_option(status.maxdisk),
        disk_used: Field::from_option(status.disk),
    }
}
