use crate::core::domain::model::device::{DeviceEntry, DeviceIdentity, DeviceInfo};
use async_trait::async_trait;

/// The host platform's device registry.
///
/// Implementations must tolerate concurrent calls from every coordinator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Returns the device for `identity`, creating it with `info` if needed.
    async fn get_or_create(&self, identity: &DeviceIdentity, info: DeviceInfo) -> DeviceEntry;

    /// Returns the device for `identity` without creating it.
    async fn get(&self, identity: &DeviceIdentity) -> Option<DeviceEntry>;

    /// Sets (or clears) the parent link of a device.
    async fn update_via_device(&self, device_id: &str, via_device_id: Option<String>);

    /// Removes the device for `identity`; unknown identities are ignored.
    /// Devices linked through it lose their parent link.
    async fn remove(&self, identity: &DeviceIdentity);
}
