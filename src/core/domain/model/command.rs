//! Power commands that can be sent to nodes and guests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands accepted by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCommand {
    Reboot,
    Shutdown,
    StartAll,
    StopAll,
    WakeOnLan,
}

impl NodeCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeCommand::Reboot => "reboot",
            NodeCommand::Shutdown => "shutdown",
            NodeCommand::StartAll => "startall",
            NodeCommand::StopAll => "stopall",
            NodeCommand::WakeOnLan => "wakeonlan",
        }
    }

    /// API path the command is posted to.
    pub fn api_path(&self, node: &str) -> String {
        match self {
            NodeCommand::StartAll | NodeCommand::StopAll | NodeCommand::WakeOnLan => {
                format!("nodes/{}/{}", node, self.as_str())
            }
            NodeCommand::Reboot | NodeCommand::Shutdown => {
                format!("nodes/{}/status?command={}", node, self.as_str())
            }
        }
    }
}

impl fmt::Display for NodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands accepted by a virtual machine or container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestCommand {
    Start,
    Stop,
    Shutdown,
    Reboot,
    Reset,
    Suspend,
    Resume,
    /// Suspend to disk.
    Hibernate,
}

impl GuestCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestCommand::Start => "start",
            GuestCommand::Stop => "stop",
            GuestCommand::Shutdown => "shutdown",
            GuestCommand::Reboot => "reboot",
            GuestCommand::Reset => "reset",
            GuestCommand::Suspend => "suspend",
            GuestCommand::Resume => "resume",
            GuestCommand::Hibernate => "hibernate",
        }
    }

    /// API path the command is posted to. `category` is `qemu` or `lxc`.
    pub fn api_path(&self, node: &str, category: &str, vmid: u32) -> String {
        match self {
            GuestCommand::Hibernate => format!(
                "nodes/{}/{}/{}/status/suspend?todisk=1",
                node, category, vmid
            ),
            other => format!(
                "nodes/{}/{}/{}/status/{}",
                node,
                category,
                vmid,
                other.as_str()
            ),
        }
    }
}

impl fmt::Display for GuestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
