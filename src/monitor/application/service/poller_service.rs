//! Reads with per-resource permission handling.
//!
//! A 403 on one resource becomes a repair issue and an absent payload, so the
//! rest of the refresh cycle goes on. Authentication failures propagate as
//! fatal and everything else as transient.

use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            repair_issue::{IssueReason, RepairIssue, issue_id},
            resource_kind::ResourceKind,
        },
    },
    monitor::application::context::MonitorContext,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// What a read is about, for repair issue bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollScope {
    /// Cluster-wide listings. The server filters these by ACL, so a refusal
    /// means something is wrong with the session and fails the cycle.
    Cluster,
    /// One monitored resource.
    Resource {
        kind: ResourceKind,
        /// Middle part of the issue id.
        resource: String,
        /// ACL path component named in the permission string.
        target: String,
    },
}

impl PollScope {
    pub fn node(node: &str) -> Self {
        PollScope::Resource {
            kind: ResourceKind::Node,
            resource: node.to_string(),
            target: node.to_string(),
        }
    }

    pub fn guest(kind: ResourceKind, vmid: u32) -> Self {
        PollScope::Resource {
            kind,
            resource: vmid.to_string(),
            target: vmid.to_string(),
        }
    }

    pub fn storage(storage: &str) -> Self {
        PollScope::Resource {
            kind: ResourceKind::Storage,
            resource: storage.to_string(),
            target: storage.to_string(),
        }
    }

    pub fn update(node: &str) -> Self {
        PollScope::Resource {
            kind: ResourceKind::Update,
            resource: format!("update_{}", node),
            target: node.to_string(),
        }
    }

    pub fn disk(node: &str, disk_id: &str) -> Self {
        PollScope::Resource {
            kind: ResourceKind::Disk,
            resource: format!("{}_{}", node, disk_id),
            target: node.to_string(),
        }
    }

    /// Middle part of the issue ids of this resource.
    pub fn resource(&self) -> Option<&str> {
        match self {
            PollScope::Cluster => None,
            PollScope::Resource { resource, .. } => Some(resource),
        }
    }

    /// Id of the forbidden issue this scope raises, if any.
    pub fn forbidden_issue_id(&self, scope: &str) -> Option<String> {
        match self {
            PollScope::Cluster => None,
            PollScope::Resource { resource, .. } => {
                Some(issue_id(scope, resource, IssueReason::Forbidden))
            }
        }
    }
}

/// Wraps the API client with the permission-to-issue translation.
#[derive(Clone)]
pub struct PollerService {
    context: Arc<MonitorContext>,
}

impl PollerService {
    pub fn new(context: Arc<MonitorContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<MonitorContext> {
        &self.context
    }

    /// Reads `path`.
    ///
    /// On success any open forbidden issue for `scope` is cleared. A 403 on a
    /// resource scope with `raise_on_forbidden` raises that issue and yields
    /// `Ok(None)`; without the flag, or on the cluster scope, it fails the
    /// cycle as transient.
    ///
    /// # Errors
    /// `Authentication` is fatal for the endpoint; every other error is
    /// transient for the calling coordinator.
    pub async fn poll_value(
        &self,
        path: &str,
        scope: &PollScope,
        raise_on_forbidden: bool,
    ) -> ProxmoxResult<Option<Value>> {
        match self.context.api().get_value(path).await {
            Ok(data) => {
                if let Some(id) = scope.forbidden_issue_id(self.context.scope()) {
                    self.context.issues().delete(&id).await;
                }
                Ok(data)
            }
            Err(ProxmoxError::Forbidden { message, .. }) => match scope {
                PollScope::Resource {
                    kind,
                    resource,
                    target,
                } if raise_on_forbidden => {
                    debug!(
                        "{} refused for {} on {} {}: {}",
                        path,
                        self.context.user(),
                        kind.label(),
                        target,
                        message
                    );
                    let issue = RepairIssue::forbidden(
                        self.context.scope(),
                        resource,
                        *kind,
                        target,
                        self.context.user(),
                    );
                    self.context.issues().create(issue).await;
                    Ok(None)
                }
                _ => Err(ProxmoxError::UpdateFailed(format!(
                    "Permission denied on {}: {}",
                    path, message
                ))),
            },
            Err(error) => Err(error),
        }
    }

    /// Reads and decodes `path`; see [`PollerService::poll_value`].
    ///
    /// # Errors
    /// `Parse` when the payload does not have the shape of `T`.
    pub async fn poll<T>(
        &self,
        path: &str,
        scope: &PollScope,
        raise_on_forbidden: bool,
    ) -> ProxmoxResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let data = self.poll_value(path, scope, raise_on_forbidden).await?;
        decode(path, data)
    }

    /// Reads a supplementary endpoint of a resource whose primary read
    /// already owns the forbidden issue. A 403 yields `Ok(None)` and touches
    /// no issue.
    ///
    /// # Errors
    /// As [`PollerService::poll_value`], minus the permission handling.
    pub async fn poll_secondary<T>(&self, path: &str) -> ProxmoxResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.context.api().get_value(path).await {
            Ok(data) => decode(path, data),
            Err(ProxmoxError::Forbidden { message, .. }) => {
                debug!("{} refused, treating as absent: {}", path, message);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

fn decode<T>(path: &str, data: Option<Value>) -> ProxmoxResult<Option<T>>
where
    T: DeserializeOwned,
{
    match data {
        Some(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(|e| ProxmoxError::Parse(format!("{}: {}", path, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::domain::{
            error::FailureKind,
            registry::{IssueRegistry, MockIssueRegistry},
        },
        core::infrastructure::memory_registry::InMemoryDeviceRegistry,
        tests::common::{api_client_for, fixture, mount_json},
    };
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_forbidden_raises_issue_and_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/nodes/pve1/status"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "data": null,
                "message": "Permission check failed (/nodes/pve1, Sys.Audit)"
            })))
            .mount(&server)
            .await;
        let fixture = fixture(&server);
        let poller = PollerService::new(fixture.context.clone());

        let data = poller
            .poll_value("nodes/pve1/status", &PollScope::node("pve1"), true)
            .await
            .unwrap();
        assert!(data.is_none());

        let issue = fixture.issues.get("entry1_pve1_forbidden").await.unwrap();
        assert!(issue.persistent);
        assert_eq!(issue.placeholder("resource"), Some("Node pve1"));
        assert_eq!(issue.placeholder("user"), Some("monitor@pve"));
        assert_eq!(
            issue.placeholder("permission"),
            Some("['perm','/nodes/pve1',['Sys.Audit']]")
        );
    }

    #[tokio::test]
    async fn test_forbidden_without_flag_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/nodes/pve1/status"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        let fixture = fixture(&server);
        let poller = PollerService::new(fixture.context.clone());

        let error = poller
            .poll_value("nodes/pve1/status", &PollScope::node("pve1"), false)
            .await
            .unwrap_err();
        assert_eq!(error.failure_kind(), FailureKind::Transient);
        assert!(fixture.issues.is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_previous_issue() {
        let server = MockServer::start().await;
        mount_json(&server, "GET", "/api2/json/nodes/pve1/status", json!({"uptime": 10})).await;
        let fixture = fixture(&server);
        fixture
            .issues
            .create(RepairIssue::forbidden(
                "entry1",
                "pve1",
                ResourceKind::Node,
                "pve1",
                "monitor@pve",
            ))
            .await;
        let poller = PollerService::new(fixture.context.clone());

        let data = poller
            .poll_value("nodes/pve1/status", &PollScope::node("pve1"), true)
            .await
            .unwrap();
        assert_eq!(data, Some(json!({"uptime": 10})));
        assert!(fixture.issues.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_propagates_as_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/cluster/resources"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let fixture = fixture(&server);
        let poller = PollerService::new(fixture.context.clone());

        let error = poller
            .poll_value("cluster/resources", &PollScope::Cluster, true)
            .await
            .unwrap_err();
        assert_eq!(error.failure_kind(), FailureKind::Transient);
    }

    #[tokio::test]
    async fn test_secondary_forbidden_leaves_issues_alone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/nodes/pve1/version"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        let fixture = fixture(&server);
        let poller = PollerService::new(fixture.context.clone());

        let version: Option<Value> = poller.poll_secondary("nodes/pve1/version").await.unwrap();
        assert!(version.is_none());
        assert!(fixture.issues.is_empty());
    }

    #[tokio::test]
    async fn test_secondary_success_never_touches_registry() {
        let server = MockServer::start().await;
        mount_json(&server, "GET", "/api2/json/nodes/pve1/version", json!({"version": "8.2.4"})).await;
        let mut issues = MockIssueRegistry::new();
        issues.expect_create().never();
        issues.expect_delete().never();
        let context = Arc::new(MonitorContext::new(
            "entry1",
            api_client_for(&server),
            Arc::new(InMemoryDeviceRegistry::new()),
            Arc::new(issues),
        ));
        let poller = PollerService::new(context);

        let version: Option<Value> = poller.poll_secondary("nodes/pve1/version").await.unwrap();
        assert_eq!(version, Some(json!({"version": "8.2.4"})));
    }

    #[test]
    fn test_scope_issue_ids() {
        assert_eq!(PollScope::Cluster.forbidden_issue_id("entry1"), None);
        assert_eq!(
            PollScope::update("pve1").forbidden_issue_id("entry1").as_deref(),
            Some("entry1_update_pve1_forbidden")
        );
        assert_eq!(
            PollScope::disk("pve1", "/dev/sda")
                .forbidden_issue_id("entry1")
                .as_deref(),
            Some("entry1_pve1_/dev/sda_forbidden")
        );
    }
}
