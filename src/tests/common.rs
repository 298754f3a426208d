//! Shared fixtures for the wiremock-backed tests.

use crate::core::{
    domain::{
        config::ValidationConfig,
        model::proxmox_connection::{ProxmoxConnection, ProxmoxCredential},
        value_object::{
            ProxmoxApiToken, ProxmoxHost, ProxmoxPassword, ProxmoxPort, ProxmoxRealm,
            ProxmoxUsername,
        },
    },
    infrastructure::{
        api_client::ApiClient,
        memory_registry::{InMemoryDeviceRegistry, InMemoryIssueRegistry},
    },
};
use crate::monitor::application::context::MonitorContext;
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub(crate) const SCOPE: &str = "entry1";

/// A context wired to in-memory registries the test can inspect.
pub(crate) struct Fixture {
    pub context: Arc<MonitorContext>,
    pub devices: Arc<InMemoryDeviceRegistry>,
    pub issues: Arc<InMemoryIssueRegistry>,
}

fn token_connection(host: String, port: u16) -> ProxmoxConnection {
    ProxmoxConnection::new(
        ProxmoxHost::new_unchecked(host),
        ProxmoxPort::new_unchecked(port),
        ProxmoxUsername::new_unchecked("monitor".to_string()),
        ProxmoxCredential::ApiToken {
            token: ProxmoxApiToken::new_unchecked("homeassistant".to_string()),
            secret: ProxmoxPassword::new_unchecked("5f2e-secret".to_string()),
        },
        ProxmoxRealm::new_unchecked("pve".to_string()),
        false,
        true,
    )
    .unwrap()
}

/// Token-authenticated client for `server`; requests go out as `monitor@pve`
/// without a login round trip.
pub(crate) fn api_client_for(server: &MockServer) -> Arc<ApiClient> {
    let address = server.address();
    let connection = token_connection(address.ip().to_string(), address.port());
    Arc::new(ApiClient::new(connection, ValidationConfig::default()).unwrap())
}

fn fixture_with(api: Arc<ApiClient>) -> Fixture {
    let devices = Arc::new(InMemoryDeviceRegistry::new());
    let issues = Arc::new(InMemoryIssueRegistry::new());
    let context = Arc::new(MonitorContext::new(
        SCOPE,
        api,
        devices.clone(),
        issues.clone(),
    ));
    Fixture {
        context,
        devices,
        issues,
    }
}

pub(crate) fn fixture(server: &MockServer) -> Fixture {
    fixture_with(api_client_for(server))
}

/// A context whose endpoint nothing listens on.
pub(crate) fn offline_fixture() -> Fixture {
    fixture_with(Arc::new(
        ApiClient::new(
            token_connection("127.0.0.1".to_string(), 9),
            ValidationConfig::default(),
        )
        .unwrap(),
    ))
}

/// Answers `method path` with `{"data": data}`.
pub(crate) async fn mount_json(server: &MockServer, http_method: &str, api_path: &str, data: Value) {
    Mock::given(method(http_method))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

/// Answers `GET path` with a permission failure.
pub(crate) async fn mount_forbidden(server: &MockServer, api_path: &str, permission: &str) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "data": null,
            "message": format!("Permission check failed ({})", permission)
        })))
        .mount(server)
        .await;
}

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("proxmoxve_monitor=debug")
        .try_init();
}
