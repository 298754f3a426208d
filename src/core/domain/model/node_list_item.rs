//! Domain model for node list items from the `/nodes` endpoint.
//!
//! This module defines the structure of a node as returned by the Proxmox API
//! when listing all nodes in the cluster.

use crate::core::domain::value_object::serde_helpers::{lenient_f64, lenient_string, lenient_u64};
use serde::{Deserialize, Serialize};

/// Liveness value the node list reports for a reachable node.
pub const NODE_ONLINE: &str = "online";

/// A node in the Proxmox cluster.
///
/// This struct represents a node as returned by the `/api2/json/nodes` endpoint.
/// It contains identifying information, status, and resource usage statistics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeListItem {
    /// The node name (e.g., "pve1").
    pub node: String,
    /// Current node status (e.g., "online", "offline", "unknown").
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    /// CPU usage fraction (0.0 to 1.0).
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    /// Root filesystem usage in bytes.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// Root filesystem size in bytes.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub maxdisk: Option<u64>,
    /// System uptime in seconds.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

impl NodeListItem {
    pub fn is_online(&self) -> bool {
        self.status.as_deref() == Some(NODE_ONLINE)
    }
}

/// Finds `node` in a `/nodes` listing.
pub fn find_node<'a>(nodes: &'a [NodeListItem], node: &str) -> Option<&'a NodeListItem> {
    nodes.iter().find(|item| item.node == node)
}
