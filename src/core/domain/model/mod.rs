pub mod apt_update;
pub mod cluster_resource;
pub mod command;
pub mod device;
pub mod disk;
pub mod field;
pub mod guest;
pub mod node_list_item;
pub mod node_status;
pub mod proxmox_auth;
pub mod proxmox_connection;
pub mod record;
pub mod repair_issue;
pub mod resource_kind;

pub use command::{GuestCommand, NodeCommand};
pub use device::{DeviceEntry, DeviceIdentity, DeviceInfo};
pub use disk::DiskType;
pub use field::Field;
pub use record::{
    DiskRecord, LxcRecord, NodeRecord, ResourceRecord, StorageRecord, UpdateRecord, VmRecord,
};
pub use repair_issue::{IssueReason, IssueSeverity, RepairIssue};
pub use resource_kind::ResourceKind;
