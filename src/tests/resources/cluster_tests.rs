use crate::{
    core::domain::{
        config::ResourceSelection, error::FailureKind, registry::IssueRegistry,
    },
    monitor::application::service::{
        discovery_service::DiscoveryService, poller_service::PollerService,
    },
    tests::common::{fixture, mount_forbidden, mount_json},
};
use serde_json::json;
use wiremock::MockServer;

fn cluster() -> serde_json::Value {
    json!([
        {"type": "node", "id": "node/pve1", "node": "pve1", "status": "online"},
        {"type": "node", "id": "node/pve2", "node": "pve2", "status": "offline"},
        {"type": "qemu", "id": "qemu/100", "node": "pve1", "vmid": 100, "status": "running"},
        {"type": "lxc", "id": "lxc/200", "node": "pve2", "vmid": 200, "status": "stopped"},
        {"type": "storage", "id": "storage/pve1/local", "node": "pve1", "storage": "local"},
        {"type": "pool", "id": "/pool/prod", "pool": "prod"}
    ])
}

#[tokio::test]
async fn test_discovery_is_stable_across_calls() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", cluster()).await;
    let fixture = fixture(&server);
    let discovery = DiscoveryService::new(PollerService::new(fixture.context.clone()));

    let first = discovery.discover().await.unwrap();
    let second = discovery.discover().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.nodes.len(), 2);
    assert!(first.qemu.contains(&100));
    assert!(first.lxc.contains(&200));
    assert!(first.has_storage("local"));
}

#[tokio::test]
async fn test_offline_node_still_selectable() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", cluster()).await;
    let fixture = fixture(&server);
    let discovery = DiscoveryService::new(PollerService::new(fixture.context.clone()));
    let discovered = discovery.discover().await.unwrap();

    let selection = ResourceSelection {
        nodes: vec!["pve2".to_string(), "pve9".to_string()],
        lxc: vec![200],
        ..Default::default()
    };
    let available = discovery.validate_selection(&selection, &discovered).await;
    assert_eq!(available.nodes, vec!["pve2".to_string()]);
    assert_eq!(available.lxc, vec![200]);
    let issue = fixture
        .issues
        .get("entry1_pve9_resource_nonexistent")
        .await
        .unwrap();
    assert_eq!(issue.placeholder("resource_type"), Some("Node"));
    assert!(!issue.persistent);
    assert_eq!(fixture.issues.len(), 1);
}

#[tokio::test]
async fn test_refused_cluster_listing_raises_no_issue() {
    let server = MockServer::start().await;
    mount_forbidden(&server, "/api2/json/cluster/resources", "/, Sys.Audit").await;
    let fixture = fixture(&server);
    let discovery = DiscoveryService::new(PollerService::new(fixture.context.clone()));

    let error = discovery.discover().await.unwrap_err();
    assert_eq!(error.failure_kind(), FailureKind::Transient);
    assert!(fixture.issues.is_empty());
}
