//! Payloads of the virtual machine and container endpoints.
//!
//! QEMU and LXC share one shape here; the container-only swap counters are
//! simply absent on VMs.

use crate::core::domain::value_object::serde_helpers::{lenient_f64, lenient_string, lenient_u32, lenient_u64};
use serde::{Deserialize, Serialize};

/// Status value that counts a guest as running.
pub const GUEST_RUNNING: &str = "running";
/// `lock` value set while a guest is suspended to disk.
pub const LOCK_SUSPENDED: &str = "suspended";

/// A guest as returned by `/nodes/{node}/qemu` or `/nodes/{node}/lxc`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuestListItem {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub vmid: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

impl GuestListItem {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some(GUEST_RUNNING)
    }

    /// `"{name} ({vmid})"`, the form the node record lists running guests in.
    pub fn display_label(&self) -> String {
        let name = self.name.as_deref().unwrap_or_default();
        match self.vmid {
            Some(vmid) => format!("{} ({})", name, vmid),
            None => name.to_string(),
        }
    }
}

/// Runtime status from `/nodes/{node}/{qemu|lxc}/{vmid}/status/current`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct GuestStatusCurrent {
    /// Current status (e.g., "running", "stopped", "paused").
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Set while a backup, migration or suspend holds the guest.
    #[serde(default, deserialize_with = "lenient_string")]
    pub lock: Option<String>,
    /// QEMU monitor status (VMs only).
    #[serde(default, deserialize_with = "lenient_string")]
    pub qmpstatus: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub uptime: Option<u64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub maxmem: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub mem: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub netin: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub netout: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub maxdisk: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub disk: Option<u64>,
    /// Containers only.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub maxswap: Option<u64>,
    /// Containers only.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub swap: Option<u64>,
}

impl GuestStatusCurrent {
    /// Reported status, with a suspend-to-disk lock taking precedence over the
    /// stale raw status.
    pub fn effective_status(&self) -> Option<String> {
        match self.lock.as_deref() {
            Some(LOCK_SUSPENDED) => Some(LOCK_SUSPENDED.to_string()),
            _ => self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suspended_lock_overrides_status() {
        let status: GuestStatusCurrent =
            serde_json::from_value(json!({"status": "stopped", "lock": "suspended"})).unwrap();
        assert_eq!(status.effective_status().as_deref(), Some("suspended"));

        let backup: GuestStatusCurrent =
            serde_json::from_value(json!({"status": "running", "lock": "backup"})).unwrap();
        assert_eq!(backup.effective_status().as_deref(), Some("running"));
    }

    #[test]
    fn test_list_item_label() {
        let item: GuestListItem =
            serde_json::from_value(json!({"vmid": "101", "name": "web", "status": "running"}))
                .unwrap();
        assert!(item.is_running());
        assert_eq!(item.display_label(), "web (101)");
    }
}
