//! In-memory registries for embedding the monitor without a host platform.

use crate::core::domain::{
    model::{
        device::{DeviceEntry, DeviceIdentity, DeviceInfo},
        repair_issue::RepairIssue,
    },
    registry::{DeviceRegistry, IssueRegistry},
};
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Device registry backed by concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryDeviceRegistry {
    by_id: DashMap<String, DeviceEntry>,
    by_identity: DashMap<String, String>,
    insertion_counter: AtomicU64,
    via_writes: AtomicU64,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parent-link writes performed so far.
    pub fn via_write_count(&self) -> u64 {
        self.via_writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Looks a device up by its registry id.
    pub fn get_by_id(&self, device_id: &str) -> Option<DeviceEntry> {
        self.by_id.get(device_id).map(|entry| entry.clone())
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn get_or_create(&self, identity: &DeviceIdentity, info: DeviceInfo) -> DeviceEntry {
        let key = identity.key();
        match self.by_identity.entry(key.clone()) {
            Entry::Occupied(existing) => {
                if let Some(entry) = self.by_id.get(existing.get()) {
                    return entry.clone();
                }
                // Index points at a vanished device; recreate under the same id.
                let entry = DeviceEntry {
                    id: existing.get().clone(),
                    identity: key,
                    info,
                    via_device_id: None,
                };
                self.by_id.insert(entry.id.clone(), entry.clone());
                entry
            }
            Entry::Vacant(slot) => {
                let sequence = self.insertion_counter.fetch_add(1, Ordering::SeqCst) + 1;
                let entry = DeviceEntry {
                    id: format!("device_{}", sequence),
                    identity: key,
                    info,
                    via_device_id: None,
                };
                debug!("Created device {} for {}", entry.id, entry.identity);
                self.by_id.insert(entry.id.clone(), entry.clone());
                slot.insert(entry.id.clone());
                entry
            }
        }
    }

    async fn get(&self, identity: &DeviceIdentity) -> Option<DeviceEntry> {
        let device_id = self.by_identity.get(&identity.key())?.clone();
        self.get_by_id(&device_id)
    }

    async fn update_via_device(&self, device_id: &str, via_device_id: Option<String>) {
        if let Some(mut entry) = self.by_id.get_mut(device_id) {
            debug!(
                "Device {} via {:?} -> {:?}",
                device_id, entry.via_device_id, via_device_id
            );
            entry.via_device_id = via_device_id;
            self.via_writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn remove(&self, identity: &DeviceIdentity) {
        let Some((_, device_id)) = self.by_identity.remove(&identity.key()) else {
            return;
        };
        self.by_id.remove(&device_id);
        for mut entry in self.by_id.iter_mut() {
            if entry.via_device_id.as_deref() == Some(device_id.as_str()) {
                entry.via_device_id = None;
            }
        }
        info!("Removed device {} for {}", device_id, identity);
    }
}

/// Issue registry backed by a concurrent map; ids are unique by construction.
#[derive(Debug, Default)]
pub struct InMemoryIssueRegistry {
    issues: DashMap<String, RepairIssue>,
}

impl InMemoryIssueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn contains(&self, issue_id: &str) -> bool {
        self.issues.contains_key(issue_id)
    }
}

#[async_trait]
impl IssueRegistry for InMemoryIssueRegistry {
    async fn create(&self, issue: RepairIssue) {
        if self.issues.insert(issue.issue_id.clone(), issue.clone()).is_none() {
            info!("Repair issue {} raised", issue.issue_id);
        }
    }

    async fn delete(&self, issue_id: &str) {
        if self.issues.remove(issue_id).is_some() {
            info!("Repair issue {} cleared", issue_id);
        }
    }

    async fn get(&self, issue_id: &str) -> Option<RepairIssue> {
        self.issues.get(issue_id).map(|issue| issue.clone())
    }

    async fn list(&self) -> Vec<RepairIssue> {
        let mut issues: Vec<RepairIssue> =
            self.issues.iter().map(|issue| issue.value().clone()).collect();
        issues.sort_by(|a, b| a.issue_id.cmp(&b.issue_id));
        issues
    }
}
