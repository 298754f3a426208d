//! Collaborator interfaces owned by the host platform.
//!
//! Coordinators receive these as injected trait objects; the crate ships
//! in-memory implementations in `core::infrastructure::memory_registry`.

pub mod device_registry;
pub mod issue_registry;

pub use device_registry::DeviceRegistry;
pub use issue_registry::IssueRegistry;

#[cfg(test)]
pub use device_registry::MockDeviceRegistry;
#[cfg(test)]
pub use issue_registry::MockIssueRegistry;
