//! Operator-facing repair issues.
//!
//! An issue is keyed by `{scope}_{resource}_{reason}`. Creating an existing key
//! replaces it; deleting a missing key is a no-op.

use super::resource_kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Integration title shown in issue texts.
pub const INTEGRATION_TITLE: &str = "Proxmox VE";
/// Platform name shown in issue texts.
pub const PLATFORM: &str = "proxmoxve";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// Why an issue was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueReason {
    /// The configured user may not read the resource.
    Forbidden,
    /// A selected resource is no longer part of the cluster.
    ResourceNonexistent,
    /// The configured user may not run a command on the resource.
    CommandForbidden,
}

impl IssueReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueReason::Forbidden => "forbidden",
            IssueReason::ResourceNonexistent => "resource_nonexistent",
            IssueReason::CommandForbidden => "command_forbidden",
        }
    }

    /// Template name of the issue text.
    pub fn translation_key(&self) -> &'static str {
        match self {
            IssueReason::Forbidden => "resource_exception_forbidden",
            IssueReason::ResourceNonexistent => "resource_nonexistent",
            IssueReason::CommandForbidden => "resource_command_forbidden",
        }
    }
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{scope}_{resource}_{reason}`.
pub fn issue_id(scope: &str, resource: &str, reason: IssueReason) -> String {
    format!("{}_{}_{}", scope, resource, reason)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairIssue {
    pub issue_id: String,
    pub severity: IssueSeverity,
    pub translation_key: String,
    pub placeholders: BTreeMap<String, String>,
    /// Survives a restart of the host platform.
    pub persistent: bool,
}

impl RepairIssue {
    fn build(
        scope: &str,
        resource: &str,
        reason: IssueReason,
        persistent: bool,
        placeholders: BTreeMap<String, String>,
    ) -> Self {
        Self {
            issue_id: issue_id(scope, resource, reason),
            severity: IssueSeverity::Error,
            translation_key: reason.translation_key().to_string(),
            placeholders,
            persistent,
        }
    }

    /// A read of `resource` was refused for `user`.
    ///
    /// `target` is the ACL path component (node name, guest id or storage name).
    pub fn forbidden(
        scope: &str,
        resource: &str,
        kind: ResourceKind,
        target: &str,
        user: &str,
    ) -> Self {
        let placeholders = BTreeMap::from([
            ("resource".to_string(), format!("{} {}", kind.label(), target)),
            ("user".to_string(), user.to_string()),
            ("permission".to_string(), kind.permission(target)),
        ]);
        Self::build(scope, resource, IssueReason::Forbidden, true, placeholders)
    }

    /// A selected resource was not found in the cluster listing.
    pub fn resource_nonexistent(
        scope: &str,
        resource: &str,
        kind: ResourceKind,
        target: &str,
        host: &str,
        port: u16,
    ) -> Self {
        let placeholders = BTreeMap::from([
            ("integration".to_string(), INTEGRATION_TITLE.to_string()),
            ("platform".to_string(), PLATFORM.to_string()),
            ("host".to_string(), host.to_string()),
            ("port".to_string(), port.to_string()),
            ("resource_type".to_string(), kind.label().to_string()),
            ("resource".to_string(), resource.to_string()),
            ("permission".to_string(), kind.permission(target)),
        ]);
        Self::build(
            scope,
            resource,
            IssueReason::ResourceNonexistent,
            false,
            placeholders,
        )
    }

    /// A command was refused; `permission` is the check quoted by the server.
    pub fn command_forbidden(
        scope: &str,
        resource: &str,
        resource_label: &str,
        user: &str,
        permission: &str,
        command: &str,
    ) -> Self {
        let placeholders = BTreeMap::from([
            ("resource".to_string(), resource_label.to_string()),
            ("user".to_string(), user.to_string()),
            ("permission".to_string(), permission.to_string()),
            ("command".to_string(), command.to_string()),
        ]);
        Self::build(
            scope,
            resource,
            IssueReason::CommandForbidden,
            false,
            placeholders,
        )
    }

    pub fn placeholder(&self, key: &str) -> Option<&str> {
        self.placeholders.get(key).map(String::as_str)
    }
}
