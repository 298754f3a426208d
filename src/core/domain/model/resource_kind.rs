//! The closed set of resource kinds the monitor knows about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a monitored resource.
///
/// Every place that branches on the kind (discovery, device identity,
/// permission strings, coordinator construction) matches on this enum
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Node,
    Qemu,
    Lxc,
    Storage,
    Update,
    Disk,
}

impl ResourceKind {
    /// Lowercase name, as used in API paths (`nodes/{n}/qemu/...`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Node => "node",
            ResourceKind::Qemu => "qemu",
            ResourceKind::Lxc => "lxc",
            ResourceKind::Storage => "storage",
            ResourceKind::Update => "update",
            ResourceKind::Disk => "disk",
        }
    }

    /// Uppercase tag embedded in device identities.
    pub fn identity_tag(&self) -> &'static str {
        match self {
            ResourceKind::Node => "NODE",
            ResourceKind::Qemu => "QEMU",
            ResourceKind::Lxc => "LXC",
            ResourceKind::Storage => "STORAGE",
            ResourceKind::Update => "UPDATE",
            ResourceKind::Disk => "DISK",
        }
    }

    /// Human readable label used in repair issue placeholders.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Node => "Node",
            ResourceKind::Qemu => "QEMU",
            ResourceKind::Lxc => "LXC",
            ResourceKind::Storage => "Storage",
            ResourceKind::Update => "Update",
            ResourceKind::Disk => "Disk",
        }
    }

    /// The ACL check the server performs before answering a read of this kind.
    ///
    /// `target` is the node name for node, update and disk reads, the guest id
    /// for guests and the storage name for storages.
    pub fn permission(&self, target: &str) -> String {
        match self {
            ResourceKind::Node | ResourceKind::Disk => {
                format!("['perm','/nodes/{}',['Sys.Audit']]", target)
            }
            ResourceKind::Qemu | ResourceKind::Lxc => {
                format!("['perm','/vms/{}',['VM.Audit']]", target)
            }
            ResourceKind::Storage => {
                format!("['perm','/storage/{}',['Datastore.Audit'],'any',1]", target)
            }
            ResourceKind::Update => format!("['perm','/nodes/{}',['Sys.Modify']]", target),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
