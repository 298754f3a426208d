use crate::core::{
    domain::registry::{DeviceRegistry, IssueRegistry},
    infrastructure::api_client::ApiClient,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// State shared by every coordinator of one configured endpoint.
///
/// The API session is read-only from the coordinators' side; the registries
/// are the host platform's and must tolerate concurrent writers.
pub struct MonitorContext {
    scope: String,
    user: String,
    api: Arc<ApiClient>,
    devices: Arc<dyn DeviceRegistry>,
    issues: Arc<dyn IssueRegistry>,
    shutdown: CancellationToken,
    needs_reauth: AtomicBool,
}

impl MonitorContext {
    pub fn new(
        scope: impl Into<String>,
        api: Arc<ApiClient>,
        devices: Arc<dyn DeviceRegistry>,
        issues: Arc<dyn IssueRegistry>,
    ) -> Self {
        let user = api.connection().user_id();
        Self {
            scope: scope.into(),
            user,
            api,
            devices,
            issues,
            shutdown: CancellationToken::new(),
            needs_reauth: AtomicBool::new(false),
        }
    }

    /// The configuration scope prefixed to device identities and issue ids.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Full user id (`user@realm`) named in repair issues.
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn devices(&self) -> &dyn DeviceRegistry {
        self.devices.as_ref()
    }

    pub fn issues(&self) -> &dyn IssueRegistry {
        self.issues.as_ref()
    }

    /// Web console link for a resource fragment.
    pub fn console_url(&self, fragment: &str) -> String {
        self.api.connection().proxmox_url().console_url(fragment)
    }

    /// A token cancelled when the endpoint shuts down.
    pub fn child_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Cancels every coordinator of this endpoint.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Flags the endpoint as needing new credentials and halts all polling.
    pub fn signal_reauth(&self, reason: &str) {
        if !self.needs_reauth.swap(true, Ordering::SeqCst) {
            warn!("Authentication failed for {}: {}", self.scope, reason);
        }
        self.shutdown.cancel();
    }

    pub fn needs_reauth(&self) -> bool {
        self.needs_reauth.load(Ordering::SeqCst)
    }
}
