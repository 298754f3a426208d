//! Power commands for nodes and guests.

use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            command::{GuestCommand, NodeCommand},
            repair_issue::{IssueReason, RepairIssue, issue_id},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        context::MonitorContext,
        coordinator::guest::resolve_node,
        service::poller_service::PollerService,
    },
};
use std::{fmt, sync::Arc};
use tracing::{info, warn};

/// A virtual machine or container addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestTarget {
    Qemu(u32),
    Lxc(u32),
}

impl GuestTarget {
    pub fn kind(&self) -> ResourceKind {
        match self {
            GuestTarget::Qemu(_) => ResourceKind::Qemu,
            GuestTarget::Lxc(_) => ResourceKind::Lxc,
        }
    }

    pub fn vmid(&self) -> u32 {
        match self {
            GuestTarget::Qemu(vmid) | GuestTarget::Lxc(vmid) => *vmid,
        }
    }
}

impl fmt::Display for GuestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().label(), self.vmid())
    }
}

#[derive(Clone)]
pub struct CommandService {
    poller: PollerService,
}

impl CommandService {
    pub fn new(context: Arc<MonitorContext>) -> Self {
        Self {
            poller: PollerService::new(context),
        }
    }

    /// Sends `command` to `node`.
    ///
    /// # Errors
    /// `Forbidden` after raising a `command_forbidden` issue; transport and
    /// authentication errors as returned by the client.
    pub async fn node_command(&self, node: &str, command: NodeCommand) -> ProxmoxResult<()> {
        let label = format!("{} {}", ResourceKind::Node.label(), node);
        self.send(&command.api_path(node), node, &label, command.as_str())
            .await
    }

    /// Sends `command` to a guest, on whichever node currently hosts it.
    ///
    /// # Errors
    /// `UpdateFailed` when the guest cannot be located; otherwise as
    /// [`CommandService::node_command`].
    pub async fn guest_command(&self, guest: GuestTarget, command: GuestCommand) -> ProxmoxResult<()> {
        let node = resolve_node(&self.poller, guest.kind(), guest.vmid()).await?;
        let path = command.api_path(&node, guest.kind().as_str(), guest.vmid());
        self.send(
            &path,
            &guest.vmid().to_string(),
            &guest.to_string(),
            command.as_str(),
        )
        .await
    }

    async fn send(&self, path: &str, resource: &str, label: &str, command: &str) -> ProxmoxResult<()> {
        let context = self.poller.context();
        let id = issue_id(context.scope(), resource, IssueReason::CommandForbidden);
        match context.api().post(path).await {
            Ok(_) => {
                info!("Sent {} to {}", command, label);
                context.issues().delete(&id).await;
                Ok(())
            }
            Err(ProxmoxError::Forbidden { path, message }) => {
                warn!("{} refused for {}: {}", command, label, message);
                context
                    .issues()
                    .create(RepairIssue::command_forbidden(
                        context.scope(),
                        resource,
                        label,
                        context.user(),
                        &permission_from_message(&message),
                        command,
                    ))
                    .await;
                Err(ProxmoxError::Forbidden { path, message })
            }
            Err(error) => Err(error),
        }
    }
}

/// Extracts `"/vms/101, VM.PowerMgmt"` from a message such as
/// `"Permission check failed (/vms/101, VM.PowerMgmt)"`.
fn permission_from_message(message: &str) -> String {
    match (message.rfind('('), message.rfind(')')) {
        (Some(open), Some(close)) if open < close => message[open + 1..close].to_string(),
        _ => message.to_string(),
    }
}
