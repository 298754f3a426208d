//! Domain model for node status from the `/nodes/{node}/status` endpoint.
//!
//! This module defines the detailed status information for a specific node.

use crate::core::domain::value_object::serde_helpers::{lenient, lenient_string, lenient_u64};
use serde::{Deserialize, Serialize};

/// Detailed status information for a Proxmox node.
///
/// Returned by the `/api2/json/nodes/{node}/status` endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeStatus {
    /// Memory usage in bytes.
    #[serde(default, deserialize_with = "lenient")]
    pub memory: Option<MemoryInfo>,
    /// Swap usage in bytes.
    #[serde(default, deserialize_with = "lenient")]
    pub swap: Option<MemoryInfo>,
    /// System uptime in seconds.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub uptime: Option<u64>,
    /// CPU description.
    #[serde(default, deserialize_with = "lenient")]
    pub cpuinfo: Option<CpuInfo>,
}

/// Memory usage information. Any of the counters may be missing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MemoryInfo {
    /// Total memory in bytes.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
    /// Used memory in bytes.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub used: Option<u64>,
    /// Free memory in bytes.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub free: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CpuInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
}

/// Response of `/nodes/{node}/version`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeVersion {
    /// Package version (e.g. `8.2.4`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub release: Option<String>,
}
